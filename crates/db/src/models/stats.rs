use serde::Serialize;
use sqlx::FromRow;

/// Platform-wide totals.
#[derive(Debug, Clone, Copy, FromRow, Serialize, PartialEq, Eq)]
pub struct PlatformStats {
    pub users: i64,
    pub dashboards: i64,
    pub views: i64,
    pub sources: i64,
}
