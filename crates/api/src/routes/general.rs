use axum::routing::get;
use axum::Router;

use crate::handlers::general;
use crate::state::AppState;

/// Public routes mounted at `/general`.
///
/// ```text
/// GET /statistics        -> statistics
/// GET /test-url          -> test_url
/// GET /test-url-request  -> test_url_request
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/statistics", get(general::statistics))
        .route("/test-url", get(general::test_url))
        .route("/test-url-request", get(general::test_url_request))
}
