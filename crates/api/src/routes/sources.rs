//! Route definitions for data sources.

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::sources;
use crate::middleware::auth::{optional_auth, require_auth};
use crate::state::AppState;

/// Routes mounted at `/sources`.
///
/// ```text
/// GET  /sources        -> list_sources
/// POST /create-source  -> create_source
/// POST /change-source  -> change_source
/// POST /delete-source  -> delete_source
/// POST /check-sources  -> check_sources
/// POST /source         -> get_source     (optional auth)
/// ```
pub fn router(state: AppState) -> Router<AppState> {
    let owner = Router::new()
        .route("/sources", get(sources::list_sources))
        .route("/create-source", post(sources::create_source))
        .route("/change-source", post(sources::change_source))
        .route("/delete-source", post(sources::delete_source))
        .route("/check-sources", post(sources::check_sources))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let lookup = Router::new()
        .route("/source", post(sources::get_source))
        .route_layer(from_fn_with_state(state, optional_auth));

    owner.merge(lookup)
}
