//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - Create / update DTOs consumed by the matching repository

pub mod dashboard;
pub mod reset_token;
pub mod source;
pub mod stats;
pub mod user;
