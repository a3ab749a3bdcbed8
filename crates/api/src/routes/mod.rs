pub mod dashboards;
pub mod general;
pub mod health;
pub mod root;
pub mod sources;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the JSON API route tree.
///
/// Route hierarchy:
///
/// ```text
/// /users/create, /authenticate, /resetpassword   public
/// /users/changepassword                          reset token
/// /users/update                                  access token
///
/// /dashboards/*                                  access token, except
/// /dashboards/check-password-needed              optional token
/// /dashboards/check-password                     public
///
/// /sources/*                                     access token, except
/// /sources/source                                optional token
///
/// /general/statistics, /test-url, /test-url-request  public
/// ```
///
/// Auth middleware needs the state up front, hence the argument.
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/users", users::router(state.clone()))
        .nest("/dashboards", dashboards::router(state.clone()))
        .nest("/sources", sources::router(state))
        .nest("/general", general::router())
}
