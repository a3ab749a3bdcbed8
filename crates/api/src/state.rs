use std::sync::Arc;

use crate::config::ServerConfig;
use crate::mail::Mailer;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: dashhub_db::DbPool,
    /// Server configuration (read by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// Outbound mail for password reset links.
    pub mailer: Arc<dyn Mailer>,
    /// HTTP client used by the URL probing endpoints.
    pub http: reqwest::Client,
}
