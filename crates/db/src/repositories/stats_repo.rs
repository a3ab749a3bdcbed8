//! Aggregate queries across all tables.

use sqlx::PgPool;

use crate::models::stats::PlatformStats;

pub struct StatsRepo;

impl StatsRepo {
    /// Count users, dashboards and sources, and sum dashboard views.
    pub async fn platform_totals(pool: &PgPool) -> Result<PlatformStats, sqlx::Error> {
        sqlx::query_as::<_, PlatformStats>(
            "SELECT
                (SELECT COUNT(*) FROM users) AS users,
                (SELECT COUNT(*) FROM dashboards) AS dashboards,
                (SELECT COALESCE(SUM(views), 0)::BIGINT FROM dashboards) AS views,
                (SELECT COUNT(*) FROM sources) AS sources",
        )
        .fetch_one(pool)
        .await
    }
}
