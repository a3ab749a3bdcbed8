//! Repository for the `sources` table.

use dashhub_core::rules::DEFAULT_SOURCE_TYPE;
use dashhub_core::types::DbId;
use sqlx::PgPool;

use crate::models::source::{Source, SourceFields};

const COLUMNS: &str = "\
    id, owner_id, name, source_type, url, login, passcode, vhost, \
    created_at, updated_at";

/// Provides CRUD operations for message sources.
pub struct SourceRepo;

impl SourceRepo {
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        input: &SourceFields,
    ) -> Result<Source, sqlx::Error> {
        let query = format!(
            "INSERT INTO sources (owner_id, name, source_type, url, login, passcode, vhost) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Source>(&query)
            .bind(owner_id)
            .bind(&input.name)
            .bind(&input.source_type)
            .bind(&input.url)
            .bind(&input.login)
            .bind(&input.passcode)
            .bind(&input.vhost)
            .fetch_one(pool)
            .await
    }

    /// List the sources owned by a user, oldest first.
    pub async fn list_by_owner(pool: &PgPool, owner_id: DbId) -> Result<Vec<Source>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sources WHERE owner_id = $1 ORDER BY id");
        sqlx::query_as::<_, Source>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// Names of every source a user owns, oldest first.
    pub async fn list_names(pool: &PgPool, owner_id: DbId) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM sources WHERE owner_id = $1 ORDER BY id")
                .bind(owner_id)
                .fetch_all(pool)
                .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    pub async fn find_owned(
        pool: &PgPool,
        id: DbId,
        owner_id: DbId,
    ) -> Result<Option<Source>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sources WHERE id = $1 AND owner_id = $2");
        sqlx::query_as::<_, Source>(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_name(
        pool: &PgPool,
        owner_id: DbId,
        name: &str,
    ) -> Result<Option<Source>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sources WHERE owner_id = $1 AND name = $2");
        sqlx::query_as::<_, Source>(&query)
            .bind(owner_id)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Whether `owner_id` already has a source called `name`, ignoring the
    /// source `except_id` when given.
    pub async fn name_taken(
        pool: &PgPool,
        owner_id: DbId,
        name: &str,
        except_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let (taken,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                SELECT 1 FROM sources
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

    /// Replace every connection field of an owned source. Returns `None` if not owned.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        owner_id: DbId,
        input: &SourceFields,
    ) -> Result<Option<Source>, sqlx::Error> {
        let query = format!(
            "UPDATE sources SET
                name = $3, source_type = $4, url = $5, login = $6, passcode = $7, vhost = $8
             WHERE id = $1 AND owner_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Source>(&query)
            .bind(id)
            .bind(owner_id)
            .bind(&input.name)
            .bind(&input.source_type)
            .bind(&input.url)
            .bind(&input.login)
            .bind(&input.passcode)
            .bind(&input.vhost)
            .fetch_optional(pool)
            .await
    }

    /// Create an empty default source for each name the owner does not have yet.
    ///
    /// Returns the names that were actually inserted; existing names are skipped.
    pub async fn create_missing(
        pool: &PgPool,
        owner_id: DbId,
        names: &[String],
    ) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "INSERT INTO sources (owner_id, name, source_type)
             SELECT $1, n, $3 FROM UNNEST($2::TEXT[]) AS n
             ON CONFLICT ON CONSTRAINT uq_sources_owner_id_name DO NOTHING
             RETURNING name",
        )
        .bind(owner_id)
        .bind(names)
        .bind(DEFAULT_SOURCE_TYPE)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    /// Delete a source. Returns `true` if a row owned by `owner_id` was removed.
    pub async fn delete_owned(pool: &PgPool, id: DbId, owner_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sources WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
