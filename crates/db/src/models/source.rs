//! Message-source connection profile models and DTOs.

use dashhub_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `sources` table.
#[derive(Debug, Clone, FromRow)]
pub struct Source {
    pub id: DbId,
    pub owner_id: DbId,
    pub name: String,
    pub source_type: String,
    pub url: String,
    pub login: String,
    pub passcode: String,
    pub vhost: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating or fully replacing a source's connection fields.
#[derive(Debug, Clone, Default)]
pub struct SourceFields {
    pub name: String,
    pub source_type: String,
    pub url: String,
    pub login: String,
    pub passcode: String,
    pub vhost: String,
}
