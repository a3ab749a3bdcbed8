//! Names of the unique constraints declared in the migrations.
//!
//! Handlers check these before writing; the constraints catch the writes
//! that lose the race between check and insert.

pub const USERS_USERNAME: &str = "uq_users_username";
pub const USERS_EMAIL: &str = "uq_users_email";
pub const DASHBOARDS_OWNER_NAME: &str = "uq_dashboards_owner_id_name";
pub const SOURCES_OWNER_NAME: &str = "uq_sources_owner_id_name";

/// Whether `err` is a unique violation of one of `constraints`.
pub fn violates(err: &sqlx::Error, constraints: &[&str]) -> bool {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => db_err
            .constraint()
            .is_some_and(|name| constraints.contains(&name)),
        _ => false,
    }
}
