//! Route definitions for accounts and password management.

use axum::middleware::from_fn_with_state;
use axum::routing::post;
use axum::Router;

use crate::handlers::users;
use crate::middleware::auth::{optional_auth, require_auth};
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// POST /create          -> register               (public)
/// POST /authenticate    -> authenticate           (public)
/// POST /resetpassword   -> request_password_reset (public)
/// POST /changepassword  -> change_password        (reset token)
/// POST /update          -> update_profile         (access token)
/// ```
pub fn router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/create", post(users::register))
        .route("/authenticate", post(users::authenticate))
        .route("/resetpassword", post(users::request_password_reset));

    // The body schema is checked before the token, so this route only
    // attaches the token and lets the handler reject a missing one.
    let reset = Router::new()
        .route("/changepassword", post(users::change_password))
        .route_layer(from_fn_with_state(state.clone(), optional_auth));

    let protected = Router::new()
        .route("/update", post(users::update_profile))
        .route_layer(from_fn_with_state(state, require_auth));

    public.merge(reset).merge(protected)
}
