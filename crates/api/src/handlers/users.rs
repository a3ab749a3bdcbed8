//! Handlers for registration, sign-in and password management.

use axum::extract::State;
use axum::Json;
use dashhub_core::error::CoreError;
use dashhub_core::types::DbId;
use dashhub_db::constraints;
use dashhub_db::models::user::{CreateUser, UpdateUser};
use dashhub_db::repositories::{ResetTokenRepo, UserRepo};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::auth::jwt::{generate_access_token, generate_reset_token, hash_reset_token};
use crate::auth::password::{hash_password, verify_password};
use crate::error::{conflict_on, AppError, AppResult};
use crate::mail::reset_password_mail;
use crate::middleware::auth::{AuthUser, ResetGrant};
use crate::middleware::validation::{
    lowercase_trimmed, require_any, trimmed, trimmed_opt, validate_email, validate_password,
    validate_password_length, validate_username, ValidatedJson,
};
use crate::response::{ok, Acknowledged, Empty, Success};
use crate::state::AppState;

const USER_EXISTS: &str = "Registration Error: A user with that e-mail or username already exists.";
const USER_NOT_FOUND: &str = "Resource Error: User not found.";
const USERNAME_TAKEN: &str = "A user with that username already exists.";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    #[serde(default, deserialize_with = "lowercase_trimmed")]
    #[validate(custom(function = "validate_email"))]
    pub email: String,
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(custom(function = "validate_password"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AuthenticateRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(custom(function = "validate_password"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(custom(function = "validate_username"))]
    pub username: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(custom(function = "validate_password"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_update_fields"))]
pub struct UpdateRequest {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(custom(function = "validate_username"))]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(custom(function = "validate_password_length"))]
    pub password: Option<String>,
}

fn validate_update_fields(req: &UpdateRequest) -> Result<(), ValidationError> {
    require_any(req.username.as_deref(), req.password.as_deref())
}

#[derive(Debug, Serialize)]
pub struct Registered {
    pub id: DbId,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub username: String,
    pub id: DbId,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct AuthenticateResponse {
    pub user: UserInfo,
    pub token: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /users/create
///
/// Register a new account. Username and e-mail must both be unused.
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<RegisterRequest>,
) -> AppResult<Json<Success<Registered>>> {
    let existing =
        UserRepo::find_by_username_or_email(&state.pool, &input.username, &input.email).await?;
    if existing.is_some() {
        return Err(CoreError::Conflict(USER_EXISTS.into()).into());
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username: input.username,
            email: input.email,
            password_hash,
        },
    )
    .await
    .map_err(conflict_on(
        &[constraints::USERS_USERNAME, constraints::USERS_EMAIL],
        USER_EXISTS,
    ))?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    Ok(Success::new(Registered { id: user.id }))
}

/// POST /users/authenticate
///
/// Exchange username and password for an access token.
pub async fn authenticate(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<AuthenticateRequest>,
) -> AppResult<Json<AuthenticateResponse>> {
    let user = UserRepo::find_by_username(&state.pool, &input.username)
        .await?
        .ok_or_else(|| CoreError::Unauthorized("Authentication Error: User not found.".into()))?;

    let matches = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification failed: {e}")))?;
    if !matches {
        tracing::debug!(user_id = user.id, "Password mismatch on sign-in");
        return Err(CoreError::Unauthorized(
            "Authentication Error: Password does not match!".into(),
        )
        .into());
    }

    let token = generate_access_token(user.id, &user.username, &user.email, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;

    tracing::info!(user_id = user.id, "User authenticated");

    Ok(Json(AuthenticateResponse {
        user: UserInfo {
            username: user.username,
            id: user.id,
            email: user.email,
        },
        token,
    }))
}

/// POST /users/resetpassword
///
/// Issue a single-use reset token and mail it to the account's address.
/// Any previously issued token for the user stops working.
pub async fn request_password_reset(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<ResetRequest>,
) -> AppResult<Json<Acknowledged>> {
    let user = UserRepo::find_by_username(&state.pool, &input.username)
        .await?
        .ok_or_else(|| CoreError::NotFound(USER_NOT_FOUND.into()))?;

    let token = generate_reset_token(&user.username, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;
    ResetTokenRepo::replace(&state.pool, &user.username, &hash_reset_token(&token)).await?;

    let mail = reset_password_mail(&user.email, &state.config.reset_url_base, &token);
    if let Err(e) = state.mailer.send(&mail).await {
        tracing::error!(user_id = user.id, error = %e, "Failed to send password reset mail");
    }

    tracing::info!(user_id = user.id, "Password reset requested");

    Ok(Acknowledged::new("Forgot password e-mail sent."))
}

/// POST /users/changepassword
///
/// Set a new password using a reset token. The token is consumed, so a
/// second attempt with the same token fails with 410.
pub async fn change_password(
    State(state): State<AppState>,
    ResetGrant(grant): ResetGrant,
    ValidatedJson(input): ValidatedJson<ChangePasswordRequest>,
) -> AppResult<Json<Acknowledged>> {
    let grant = grant.ok_or(AppError::Unauthenticated)?;

    let user = UserRepo::find_by_username(&state.pool, &grant.username)
        .await?
        .ok_or_else(|| CoreError::NotFound(USER_NOT_FOUND.into()))?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;

    let redeemed = ResetTokenRepo::redeem(
        &state.pool,
        user.id,
        &user.username,
        &hash_reset_token(&grant.raw_token),
        &password_hash,
    )
    .await?;
    if !redeemed {
        return Err(CoreError::Expired("Resource Error: Reset token has expired.".into()).into());
    }

    tracing::info!(user_id = user.id, "Password changed via reset token");

    Ok(Acknowledged::new("Password was changed."))
}

/// POST /users/update
///
/// Change the signed-in user's username and/or password.
pub async fn update_profile(
    auth: AuthUser,
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<UpdateRequest>,
) -> AppResult<Json<Success<Empty>>> {
    if let Some(username) = &input.username {
        if UserRepo::username_taken(&state.pool, username, auth.user_id).await? {
            return Err(CoreError::Conflict(USERNAME_TAKEN.into()).into());
        }
    }

    let password_hash = input
        .password
        .as_deref()
        .map(hash_password)
        .transpose()
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;

    UserRepo::update(
        &state.pool,
        auth.user_id,
        &UpdateUser {
            username: input.username,
            password_hash,
        },
    )
    .await
    .map_err(conflict_on(&[constraints::USERS_USERNAME], USERNAME_TAKEN))?
    .ok_or_else(|| CoreError::NotFound(USER_NOT_FOUND.into()))?;

    tracing::info!(user_id = auth.user_id, "User profile updated");

    Ok(ok())
}
