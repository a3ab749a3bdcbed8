//! Handlers for dashboard management and public dashboard access.
//!
//! Owner-only endpoints take [`AuthUser`]; the two access-check endpoints are
//! public and decide what to reveal with [`dashhub_core::access`].

use axum::extract::State;
use axum::Json;
use dashhub_core::access::{
    decide_access, decide_password_check, AccessContext, AccessDecision, PasswordCheck,
};
use dashhub_core::error::CoreError;
use dashhub_core::rules::{effective_password, INITIAL_NEXT_ID};
use dashhub_core::types::DbId;
use dashhub_db::constraints;
use dashhub_db::models::dashboard::{CreateDashboard, Dashboard, DashboardSummary, SaveDashboard};
use dashhub_db::repositories::{DashboardRepo, SourceRepo};
use serde::{Deserialize, Serialize, Serializer};

use crate::auth::password::{hash_password, verify_optional};
use crate::error::{conflict_on, AppError, AppResult};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::middleware::validation::{db_id, JsonBody, QueryParams};
use crate::response::{ok, Empty, Success};
use crate::state::AppState;

const NAME_TAKEN: &str = "A dashboard with that name already exists.";
const SELECTED_NOT_FOUND: &str = "The selected dashboard has not been found.";
const SPECIFIED_NOT_FOUND: &str = "The specified dashboard has not been found.";

fn selected_missing() -> AppError {
    CoreError::Missing(SELECTED_NOT_FOUND.into()).into()
}

fn specified_missing() -> AppError {
    CoreError::Missing(SPECIFIED_NOT_FOUND.into()).into()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateDashboardRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct IdRequest {
    #[serde(deserialize_with = "db_id")]
    pub id: DbId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardIdRequest {
    #[serde(deserialize_with = "db_id")]
    pub dashboard_id: DbId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveDashboardRequest {
    #[serde(deserialize_with = "db_id")]
    pub id: DbId,
    pub layout: serde_json::Value,
    pub items: serde_json::Value,
    pub next_id: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneDashboardRequest {
    #[serde(deserialize_with = "db_id")]
    pub dashboard_id: DbId,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameDashboardRequest {
    #[serde(deserialize_with = "db_id")]
    pub id: DbId,
    pub name: String,
}

/// Body of `check-password` and `change-password`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardPasswordRequest {
    #[serde(deserialize_with = "db_id")]
    pub dashboard_id: DbId,
    #[serde(default)]
    pub password: Option<String>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct DashboardList {
    pub dashboards: Vec<DashboardSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDetail {
    pub id: DbId,
    pub name: String,
    pub layout: serde_json::Value,
    pub items: serde_json::Value,
    pub next_id: i32,
}

#[derive(Debug, Serialize)]
pub struct DashboardWithSources {
    pub dashboard: DashboardDetail,
    pub sources: Vec<String>,
}

/// What a visitor gets to render.
#[derive(Debug, Serialize)]
pub struct DashboardContent {
    pub name: String,
    pub layout: serde_json::Value,
    pub items: serde_json::Value,
}

impl From<Dashboard> for DashboardContent {
    fn from(d: Dashboard) -> Self {
        Self {
            name: d.name,
            layout: d.layout,
            items: d.items,
        }
    }
}

/// How the dashboard owner is presented to the requester: `"self"` to the
/// owner, the owner's id for public content, `""` when nothing is revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerRef {
    Myself,
    Hidden,
    User(DbId),
}

impl Serialize for OwnerRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OwnerRef::Myself => serializer.serialize_str("self"),
            OwnerRef::Hidden => serializer.serialize_str(""),
            OwnerRef::User(id) => serializer.serialize_i64(*id),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessResponse {
    pub owner: OwnerRef,
    pub shared: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_password: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_needed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard: Option<DashboardContent>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordCheckResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_password: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dashboard: Option<DashboardContent>,
}

#[derive(Debug, Serialize)]
pub struct SharedState {
    pub shared: bool,
}

// ---------------------------------------------------------------------------
// Owner endpoints
// ---------------------------------------------------------------------------

/// GET /dashboards/dashboards
pub async fn list_dashboards(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Success<DashboardList>>> {
    let dashboards = DashboardRepo::list_by_owner(&state.pool, auth.user_id).await?;
    Ok(Success::new(DashboardList { dashboards }))
}

/// POST /dashboards/create-dashboard
///
/// Create an empty dashboard: no layout, no items, next item id 1.
pub async fn create_dashboard(
    auth: AuthUser,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateDashboardRequest>,
) -> AppResult<Json<Success<Empty>>> {
    if DashboardRepo::name_taken(&state.pool, auth.user_id, &input.name, None).await? {
        return Err(CoreError::Conflict(NAME_TAKEN.into()).into());
    }

    let dashboard = DashboardRepo::create(
        &state.pool,
        auth.user_id,
        &CreateDashboard {
            name: input.name,
            layout: serde_json::json!([]),
            items: serde_json::json!({}),
            next_id: INITIAL_NEXT_ID,
        },
    )
    .await
    .map_err(conflict_on(&[constraints::DASHBOARDS_OWNER_NAME], NAME_TAKEN))?;

    tracing::info!(
        dashboard_id = dashboard.id,
        user_id = auth.user_id,
        name = %dashboard.name,
        "Dashboard created",
    );

    Ok(ok())
}

/// POST /dashboards/delete-dashboard
pub async fn delete_dashboard(
    auth: AuthUser,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<IdRequest>,
) -> AppResult<Json<Success<Empty>>> {
    if !DashboardRepo::delete_owned(&state.pool, input.id, auth.user_id).await? {
        return Err(selected_missing());
    }

    tracing::info!(dashboard_id = input.id, user_id = auth.user_id, "Dashboard deleted");

    Ok(ok())
}

/// GET /dashboards/dashboard?id=
///
/// Full dashboard for editing, plus the names of the owner's sources.
pub async fn get_dashboard(
    auth: AuthUser,
    State(state): State<AppState>,
    QueryParams(query): QueryParams<IdRequest>,
) -> AppResult<Json<Success<DashboardWithSources>>> {
    let dashboard = DashboardRepo::find_owned(&state.pool, query.id, auth.user_id)
        .await?
        .ok_or_else(selected_missing)?;
    let sources = SourceRepo::list_names(&state.pool, auth.user_id).await?;

    Ok(Success::new(DashboardWithSources {
        dashboard: DashboardDetail {
            id: dashboard.id,
            name: dashboard.name,
            layout: dashboard.layout,
            items: dashboard.items,
            next_id: dashboard.next_id,
        },
        sources,
    }))
}

/// POST /dashboards/save-dashboard
pub async fn save_dashboard(
    auth: AuthUser,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<SaveDashboardRequest>,
) -> AppResult<Json<Success<Empty>>> {
    let content = SaveDashboard {
        layout: input.layout,
        items: input.items,
        next_id: input.next_id,
    };
    DashboardRepo::save_content(&state.pool, input.id, auth.user_id, &content)
        .await?
        .ok_or_else(selected_missing)?;

    tracing::debug!(dashboard_id = input.id, user_id = auth.user_id, "Dashboard saved");

    Ok(ok())
}

/// POST /dashboards/clone-dashboard
///
/// Copy layout, items and next id of an owned dashboard under a new name.
pub async fn clone_dashboard(
    auth: AuthUser,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CloneDashboardRequest>,
) -> AppResult<Json<Success<Empty>>> {
    if DashboardRepo::name_taken(&state.pool, auth.user_id, &input.name, None).await? {
        return Err(CoreError::Conflict(NAME_TAKEN.into()).into());
    }

    let original = DashboardRepo::find_owned(&state.pool, input.dashboard_id, auth.user_id)
        .await?
        .ok_or_else(selected_missing)?;

    let copy = DashboardRepo::create(
        &state.pool,
        auth.user_id,
        &CreateDashboard {
            name: input.name,
            layout: original.layout,
            items: original.items,
            next_id: original.next_id,
        },
    )
    .await
    .map_err(conflict_on(&[constraints::DASHBOARDS_OWNER_NAME], NAME_TAKEN))?;

    tracing::info!(
        dashboard_id = copy.id,
        cloned_from = original.id,
        user_id = auth.user_id,
        "Dashboard cloned",
    );

    Ok(ok())
}

/// POST /dashboards/rename-dashboard
pub async fn rename_dashboard(
    auth: AuthUser,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<RenameDashboardRequest>,
) -> AppResult<Json<Success<Empty>>> {
    DashboardRepo::find_owned(&state.pool, input.id, auth.user_id)
        .await?
        .ok_or_else(selected_missing)?;

    if DashboardRepo::name_taken(&state.pool, auth.user_id, &input.name, Some(input.id)).await? {
        return Err(CoreError::Conflict(NAME_TAKEN.into()).into());
    }

    DashboardRepo::rename(&state.pool, input.id, auth.user_id, &input.name)
        .await
        .map_err(conflict_on(&[constraints::DASHBOARDS_OWNER_NAME], NAME_TAKEN))?
        .ok_or_else(selected_missing)?;

    tracing::info!(dashboard_id = input.id, user_id = auth.user_id, "Dashboard renamed");

    Ok(ok())
}

/// POST /dashboards/share-dashboard
///
/// Toggle public sharing and report the new state.
pub async fn share_dashboard(
    auth: AuthUser,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<DashboardIdRequest>,
) -> AppResult<Json<Success<SharedState>>> {
    let shared = DashboardRepo::toggle_shared(&state.pool, input.dashboard_id, auth.user_id)
        .await?
        .ok_or_else(specified_missing)?;

    tracing::info!(
        dashboard_id = input.dashboard_id,
        user_id = auth.user_id,
        shared,
        "Dashboard sharing toggled",
    );

    Ok(Success::new(SharedState { shared }))
}

/// POST /dashboards/change-password
///
/// Set the dashboard access password; `null` or a blank string removes it.
pub async fn change_dashboard_password(
    auth: AuthUser,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<DashboardPasswordRequest>,
) -> AppResult<Json<Success<Empty>>> {
    let password_hash = effective_password(input.password.as_deref())
        .map(hash_password)
        .transpose()
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;
    let protected = password_hash.is_some();

    let updated = DashboardRepo::set_password(
        &state.pool,
        input.dashboard_id,
        auth.user_id,
        password_hash.as_deref(),
    )
    .await?;
    if !updated {
        return Err(specified_missing());
    }

    tracing::info!(
        dashboard_id = input.dashboard_id,
        user_id = auth.user_id,
        protected,
        "Dashboard password changed",
    );

    Ok(ok())
}

// ---------------------------------------------------------------------------
// Public access
// ---------------------------------------------------------------------------

/// POST /dashboards/check-password-needed
///
/// Decide what the requester may see. Owners and visitors of shared,
/// unprotected dashboards get the content and count as a view.
pub async fn check_password_needed(
    MaybeAuthUser(requester): MaybeAuthUser,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<DashboardIdRequest>,
) -> AppResult<Json<Success<AccessResponse>>> {
    let dashboard = DashboardRepo::find_by_id(&state.pool, input.dashboard_id)
        .await?
        .ok_or_else(specified_missing)?;

    let ctx = AccessContext {
        is_owner: requester.is_some_and(|u| u.user_id == dashboard.owner_id),
        shared: dashboard.shared,
        has_password: dashboard.has_password(),
    };
    let decision = decide_access(ctx);

    if decision.reveals_content() {
        DashboardRepo::increment_views(&state.pool, dashboard.id).await?;
    }

    tracing::debug!(dashboard_id = dashboard.id, ?decision, "Dashboard access checked");

    let response = match decision {
        AccessDecision::OwnerView => AccessResponse {
            owner: OwnerRef::Myself,
            shared: dashboard.shared,
            has_password: Some(ctx.has_password),
            password_needed: None,
            dashboard: Some(dashboard.into()),
        },
        AccessDecision::NotShared => AccessResponse {
            owner: OwnerRef::Hidden,
            shared: false,
            has_password: None,
            password_needed: None,
            dashboard: None,
        },
        AccessDecision::PublicView => AccessResponse {
            owner: OwnerRef::User(dashboard.owner_id),
            shared: true,
            has_password: None,
            password_needed: Some(false),
            dashboard: Some(dashboard.into()),
        },
        AccessDecision::PasswordRequired => AccessResponse {
            owner: OwnerRef::Hidden,
            shared: true,
            has_password: None,
            password_needed: Some(true),
            dashboard: None,
        },
    };

    Ok(Success::new(response))
}

/// POST /dashboards/check-password
///
/// Unlock a shared, password-protected dashboard. Only a correct password
/// reveals the content and counts as a view.
pub async fn check_password(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<DashboardPasswordRequest>,
) -> AppResult<Json<Success<PasswordCheckResponse>>> {
    let dashboard = DashboardRepo::find_by_id(&state.pool, input.dashboard_id)
        .await?
        .ok_or_else(specified_missing)?;

    let matched = match input.password.as_deref() {
        Some(password) => verify_optional(password, dashboard.password_hash.as_deref())
            .map_err(|e| AppError::InternalError(format!("Password verification failed: {e}")))?,
        None => false,
    };
    let outcome = decide_password_check(dashboard.shared, matched);

    tracing::debug!(dashboard_id = dashboard.id, ?outcome, "Dashboard password checked");

    let response = match outcome {
        PasswordCheck::NotShared => PasswordCheckResponse {
            correct_password: None,
            owner: Some(OwnerRef::Hidden),
            shared: Some(false),
            dashboard: None,
        },
        PasswordCheck::Incorrect => PasswordCheckResponse {
            correct_password: Some(false),
            owner: None,
            shared: None,
            dashboard: None,
        },
        PasswordCheck::Correct => {
            DashboardRepo::increment_views(&state.pool, dashboard.id).await?;
            PasswordCheckResponse {
                correct_password: Some(true),
                owner: Some(OwnerRef::User(dashboard.owner_id)),
                shared: None,
                dashboard: Some(dashboard.into()),
            }
        }
    };

    Ok(Success::new(response))
}
