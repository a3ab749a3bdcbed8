use std::path::Path;

use axum::Router;
use tower_http::services::ServeFile;

use crate::state::AppState;

/// Serve the single-page client at `/`.
pub fn router(index_file: &Path) -> Router<AppState> {
    Router::new().route_service("/", ServeFile::new(index_file))
}
