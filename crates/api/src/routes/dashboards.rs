//! Route definitions for dashboards.

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;

use crate::handlers::dashboards;
use crate::middleware::auth::{optional_auth, require_auth};
use crate::state::AppState;

/// Routes mounted at `/dashboards`.
///
/// ```text
/// GET  /dashboards             -> list_dashboards
/// POST /create-dashboard       -> create_dashboard
/// POST /delete-dashboard       -> delete_dashboard
/// GET  /dashboard?id=          -> get_dashboard
/// POST /save-dashboard         -> save_dashboard
/// POST /clone-dashboard        -> clone_dashboard
/// POST /rename-dashboard       -> rename_dashboard
/// POST /share-dashboard        -> share_dashboard
/// POST /change-password        -> change_dashboard_password
/// POST /check-password-needed  -> check_password_needed  (optional auth)
/// POST /check-password         -> check_password         (public)
/// ```
pub fn router(state: AppState) -> Router<AppState> {
    let owner = Router::new()
        .route("/dashboards", get(dashboards::list_dashboards))
        .route("/create-dashboard", post(dashboards::create_dashboard))
        .route("/delete-dashboard", post(dashboards::delete_dashboard))
        .route("/dashboard", get(dashboards::get_dashboard))
        .route("/save-dashboard", post(dashboards::save_dashboard))
        .route("/clone-dashboard", post(dashboards::clone_dashboard))
        .route("/rename-dashboard", post(dashboards::rename_dashboard))
        .route("/share-dashboard", post(dashboards::share_dashboard))
        .route("/change-password", post(dashboards::change_dashboard_password))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let visitor = Router::new()
        .route(
            "/check-password-needed",
            post(dashboards::check_password_needed),
        )
        .route_layer(from_fn_with_state(state, optional_auth));

    let public = Router::new().route("/check-password", post(dashboards::check_password));

    owner.merge(visitor).merge(public)
}
