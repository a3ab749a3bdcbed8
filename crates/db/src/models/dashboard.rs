//! Dashboard models and DTOs.

use dashhub_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `dashboards` table, including the optional password hash.
#[derive(Debug, Clone, FromRow)]
pub struct Dashboard {
    pub id: DbId,
    pub owner_id: DbId,
    pub name: String,
    pub layout: serde_json::Value,
    pub items: serde_json::Value,
    pub next_id: i32,
    pub shared: bool,
    pub password_hash: Option<String>,
    pub views: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Dashboard {
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

/// Listing entry returned by `DashboardRepo::list_by_owner`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DashboardSummary {
    pub id: DbId,
    pub name: String,
    pub views: i64,
}

/// DTO for creating a dashboard (fresh or cloned).
#[derive(Debug, Clone)]
pub struct CreateDashboard {
    pub name: String,
    pub layout: serde_json::Value,
    pub items: serde_json::Value,
    pub next_id: i32,
}

/// DTO for saving the editable content of a dashboard.
#[derive(Debug, Clone)]
pub struct SaveDashboard {
    pub layout: serde_json::Value,
    pub items: serde_json::Value,
    pub next_id: i32,
}
