//! Token-based access control.
//!
//! [`require_auth`] and [`optional_auth`] are `from_fn_with_state`
//! middlewares. They locate a bearer token, verify it, and store the
//! result as a [`VerifiedToken`] request extension. The extractors below
//! read that extension and enforce the token kind each handler needs.
//!
//! Token lookup order (first hit wins):
//! 1. `Authorization: Bearer <t>` or `x-access-token` header
//! 2. `?token=` query parameter
//! 3. `token` field of a JSON body
//! 4. `token` cookie

use axum::body::Body;
use axum::extract::{FromRequestParts, Query, Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use dashhub_core::types::DbId;
use serde::Deserialize;

use crate::auth::jwt::{validate_token, Claims, TokenKind};
use crate::error::AppError;
use crate::state::AppState;

/// Largest body buffered while looking for a `token` field.
const MAX_TOKEN_BODY_BYTES: usize = 2 * 1024 * 1024;

/// A token that passed signature and expiry checks, plus its raw form.
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub claims: Claims,
    pub raw: String,
}

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

/// Reject the request with 403 unless it carries a valid token.
pub async fn require_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut request, token) = locate_token(request).await?;
    let token = token.ok_or_else(|| {
        tracing::debug!("No token presented");
        AppError::Unauthenticated
    })?;

    let claims = validate_token(&token, &state.config.jwt).map_err(|e| {
        tracing::debug!(error = %e, "Token verification failed");
        AppError::Unauthenticated
    })?;

    request
        .extensions_mut()
        .insert(VerifiedToken { claims, raw: token });
    Ok(next.run(request).await)
}

/// Attach a [`VerifiedToken`] when a valid one is present; otherwise carry
/// on anonymously.
pub async fn optional_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut request, token) = locate_token(request).await?;

    if let Some(token) = token {
        match validate_token(&token, &state.config.jwt) {
            Ok(claims) => {
                request
                    .extensions_mut()
                    .insert(VerifiedToken { claims, raw: token });
            }
            Err(e) => tracing::debug!(error = %e, "Ignoring unverifiable token"),
        }
    }
    Ok(next.run(request).await)
}

// ---------------------------------------------------------------------------
// Token lookup
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct TokenField {
    token: Option<String>,
}

/// Find a token in the request. The body is only buffered (and then put
/// back unchanged) when neither headers nor the query string carry one.
async fn locate_token(request: Request) -> Result<(Request, Option<String>), AppError> {
    if let Some(token) = token_from_headers(request.headers()) {
        return Ok((request, Some(token)));
    }

    if let Ok(Query(TokenField { token: Some(token) })) =
        Query::<TokenField>::try_from_uri(request.uri())
    {
        if !token.is_empty() {
            return Ok((request, Some(token)));
        }
    }

    let (request, body_token) = if is_json(request.headers()) {
        let (parts, body) = request.into_parts();
        let bytes = axum::body::to_bytes(body, MAX_TOKEN_BODY_BYTES)
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read request body: {e}")))?;
        let token = token_from_json(&bytes);
        (Request::from_parts(parts, Body::from(bytes)), token)
    } else {
        (request, None)
    };

    if body_token.is_some() {
        return Ok((request, body_token));
    }

    let cookie_token = token_from_cookies(request.headers());
    Ok((request, cookie_token))
}

/// `Authorization: Bearer <t>`, falling back to `x-access-token`.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);

    let raw = bearer.or_else(|| {
        headers
            .get("x-access-token")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
    })?;

    (!raw.is_empty()).then(|| raw.to_string())
}

/// The `token` cookie, if any.
pub fn token_from_cookies(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().strip_prefix("token="))
        .find(|t| !t.is_empty())
        .map(str::to_string)
}

/// A non-empty string `token` field at the top level of a JSON object.
pub fn token_from_json(bytes: &[u8]) -> Option<String> {
    serde_json::from_slice::<TokenField>(bytes)
        .ok()
        .and_then(|f| f.token)
        .filter(|t| !t.is_empty())
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

/// Authenticated user identified by an access token.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    pub username: String,
    pub email: Option<String>,
}

impl AuthUser {
    fn from_token(token: &VerifiedToken) -> Option<Self> {
        if token.claims.kind != TokenKind::Access {
            return None;
        }
        Some(AuthUser {
            user_id: token.claims.sub?,
            username: token.claims.username.clone(),
            email: token.claims.email.clone(),
        })
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<VerifiedToken>()
            .and_then(AuthUser::from_token)
            .ok_or(AppError::Unauthenticated)
    }
}

/// The access-token user when one was presented, for public routes that
/// behave differently for owners.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(
            parts
                .extensions
                .get::<VerifiedToken>()
                .and_then(AuthUser::from_token),
        ))
    }
}

/// Holder of a password reset token, if one was presented.
///
/// Left optional so the handler can run body validation before it insists
/// on the token.
#[derive(Debug, Clone)]
pub struct ResetGrant(pub Option<ResetHolder>);

#[derive(Debug, Clone)]
pub struct ResetHolder {
    pub username: String,
    pub raw_token: String,
}

impl<S: Send + Sync> FromRequestParts<S> for ResetGrant {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let holder = parts
            .extensions
            .get::<VerifiedToken>()
            .filter(|t| t.claims.kind == TokenKind::Reset)
            .map(|t| ResetHolder {
                username: t.claims.username.clone(),
                raw_token: t.raw.clone(),
            });
        Ok(ResetGrant(holder))
    }
}
