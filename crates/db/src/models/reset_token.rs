//! Password reset token rows.

use dashhub_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `reset_tokens` table. Holds the SHA-256 digest of the
/// signed reset token, never the token itself.
#[derive(Debug, Clone, FromRow)]
pub struct ResetToken {
    pub id: DbId,
    pub username: String,
    pub token_hash: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
