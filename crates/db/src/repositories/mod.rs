//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod dashboard_repo;
pub mod reset_token_repo;
pub mod source_repo;
pub mod stats_repo;
pub mod user_repo;

pub use dashboard_repo::DashboardRepo;
pub use reset_token_repo::ResetTokenRepo;
pub use source_repo::SourceRepo;
pub use stats_repo::StatsRepo;
pub use user_repo::UserRepo;
