//! Repository for the `reset_tokens` table.
//!
//! A username holds at most one live token. Issuing replaces the previous
//! one and consuming deletes it, each in a single statement. Redeeming
//! consumes the token and sets the new password together.

use dashhub_core::types::DbId;
use sqlx::PgPool;

use crate::models::reset_token::ResetToken;

const COLUMNS: &str = "id, username, token_hash, created_at, updated_at";

pub struct ResetTokenRepo;

impl ResetTokenRepo {
    /// Store `token_hash` as the only live reset token for `username`,
    /// discarding any earlier one.
    pub async fn replace(
        pool: &PgPool,
        username: &str,
        token_hash: &str,
    ) -> Result<ResetToken, sqlx::Error> {
        let query = format!(
            "INSERT INTO reset_tokens (username, token_hash)
             VALUES ($1, $2)
             ON CONFLICT ON CONSTRAINT uq_reset_tokens_username
             DO UPDATE SET token_hash = EXCLUDED.token_hash, created_at = NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ResetToken>(&query)
            .bind(username)
            .bind(token_hash)
            .fetch_one(pool)
            .await
    }

    /// Delete the token row for `username` if it matches `token_hash`.
    ///
    /// Returns `false` when there was nothing to consume: the token was
    /// already used, replaced by a newer one, or never issued.
    pub async fn consume(
        pool: &PgPool,
        username: &str,
        token_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM reset_tokens WHERE username = $1 AND token_hash = $2")
                .bind(username)
                .bind(token_hash)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Consume the token and store the user's new password hash in one
    /// transaction. Nothing changes when the token does not match.
    ///
    /// Returns `false` when there was nothing to consume.
    pub async fn redeem(
        pool: &PgPool,
        user_id: DbId,
        username: &str,
        token_hash: &str,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let consumed =
            sqlx::query("DELETE FROM reset_tokens WHERE username = $1 AND token_hash = $2")
                .bind(username)
                .bind(token_hash)
                .execute(&mut *tx)
                .await?
                .rows_affected()
                > 0;
        if !consumed {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<ResetToken>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reset_tokens WHERE username = $1");
        sqlx::query_as::<_, ResetToken>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }
}
