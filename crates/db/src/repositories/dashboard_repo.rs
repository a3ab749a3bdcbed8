//! Repository for the `dashboards` table.
//!
//! Every mutating query except [`DashboardRepo::increment_views`] is scoped
//! by `owner_id`, so a caller can only touch dashboards it owns.

use dashhub_core::types::DbId;
use sqlx::PgPool;

use crate::models::dashboard::{CreateDashboard, Dashboard, DashboardSummary, SaveDashboard};

/// Column list for `dashboards` queries.
const COLUMNS: &str = "\
    id, owner_id, name, layout, items, next_id, shared, \
    password_hash, views, created_at, updated_at";

/// Provides data access for dashboards.
pub struct DashboardRepo;

impl DashboardRepo {
    /// Insert a dashboard for `owner_id`.
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        input: &CreateDashboard,
    ) -> Result<Dashboard, sqlx::Error> {
        let query = format!(
            "INSERT INTO dashboards (owner_id, name, layout, items, next_id) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Dashboard>(&query)
            .bind(owner_id)
            .bind(&input.name)
            .bind(&input.layout)
            .bind(&input.items)
            .bind(input.next_id)
            .fetch_one(pool)
            .await
    }

    /// List the dashboards owned by a user, oldest first.
    pub async fn list_by_owner(
        pool: &PgPool,
        owner_id: DbId,
    ) -> Result<Vec<DashboardSummary>, sqlx::Error> {
        sqlx::query_as::<_, DashboardSummary>(
            "SELECT id, name, views FROM dashboards WHERE owner_id = $1 ORDER BY id",
        )
        .bind(owner_id)
        .fetch_all(pool)
        .await
    }

    /// Find a dashboard by id regardless of owner.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Dashboard>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM dashboards WHERE id = $1");
        sqlx::query_as::<_, Dashboard>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a dashboard by id only if `owner_id` owns it.
    pub async fn find_owned(
        pool: &PgPool,
        id: DbId,
        owner_id: DbId,
    ) -> Result<Option<Dashboard>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM dashboards WHERE id = $1 AND owner_id = $2");
        sqlx::query_as::<_, Dashboard>(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(pool)
            .await
    }

    /// Whether `owner_id` already has a dashboard called `name`, ignoring
    /// the dashboard `except_id` when given.
    pub async fn name_taken(
        pool: &PgPool,
        owner_id: DbId,
        name: &str,
        except_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let (taken,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                SELECT 1 FROM dashboards
                WHERE owner_id = $1 AND name = $2 AND ($3::BIGINT IS NULL OR id <> $3)
             )",
        )
        .bind(owner_id)
        .bind(name)
        .bind(except_id)
        .fetch_one(pool)
        .await?;
        Ok(taken)
    }

    /// Overwrite layout, items and next id. Returns `None` if not owned.
    pub async fn save_content(
        pool: &PgPool,
        id: DbId,
        owner_id: DbId,
        input: &SaveDashboard,
    ) -> Result<Option<Dashboard>, sqlx::Error> {
        let query = format!(
            "UPDATE dashboards SET layout = $3, items = $4, next_id = $5 \
             WHERE id = $1 AND owner_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Dashboard>(&query)
            .bind(id)
            .bind(owner_id)
            .bind(&input.layout)
            .bind(&input.items)
            .bind(input.next_id)
            .fetch_optional(pool)
            .await
    }

    /// Rename a dashboard. Returns `None` if not owned.
    pub async fn rename(
        pool: &PgPool,
        id: DbId,
        owner_id: DbId,
        name: &str,
    ) -> Result<Option<Dashboard>, sqlx::Error> {
        let query = format!(
            "UPDATE dashboards SET name = $3 WHERE id = $1 AND owner_id = $2 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Dashboard>(&query)
            .bind(id)
            .bind(owner_id)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Flip the `shared` flag, returning its new value (`None` if not owned).
    pub async fn toggle_shared(
        pool: &PgPool,
        id: DbId,
        owner_id: DbId,
    ) -> Result<Option<bool>, sqlx::Error> {
        let row: Option<(bool,)> = sqlx::query_as(
            "UPDATE dashboards SET shared = NOT shared \
             WHERE id = $1 AND owner_id = $2 \
             RETURNING shared",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;
        Ok(row.map(|(shared,)| shared))
    }

    /// Set or clear the access password hash. Returns `true` if the row was updated.
    pub async fn set_password(
        pool: &PgPool,
        id: DbId,
        owner_id: DbId,
        password_hash: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE dashboards SET password_hash = $3 WHERE id = $1 AND owner_id = $2",
        )
        .bind(id)
        .bind(owner_id)
        .bind(password_hash)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Atomically add one view, returning the new count (`None` if the
    /// dashboard no longer exists).
    pub async fn increment_views(pool: &PgPool, id: DbId) -> Result<Option<i64>, sqlx::Error> {
        let row: Option<(i64,)> =
            sqlx::query_as("UPDATE dashboards SET views = views + 1 WHERE id = $1 RETURNING views")
                .bind(id)
                .fetch_optional(pool)
                .await?;
        Ok(row.map(|(views,)| views))
    }

    /// Delete a dashboard. Returns `true` if a row owned by `owner_id` was removed.
    pub async fn delete_owned(pool: &PgPool, id: DbId, owner_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM dashboards WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
