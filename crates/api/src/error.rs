use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dashhub_core::error::CoreError;
use serde::Serialize;

use crate::state::AppState;

/// Message that replaces every 500 body in production.
pub const REDACTED_MESSAGE: &str = "Internal server error occurred.";

/// Message returned for every authentication failure.
pub const UNAUTHENTICATED_MESSAGE: &str = "Authorization Error: Failed to verify token.";

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] so every failure goes through one mapping
/// from error kind to transport status and body.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `dashhub_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A request body failed schema validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// A request that could not be parsed at all.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing, malformed, expired, or wrong-kind token.
    #[error("Authorization Error: Failed to verify token.")]
    Unauthenticated,

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

/// JSON body of every failure response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

impl ErrorBody {
    fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            // Domain failures travel inside a 200 with their own status field.
            AppError::Core(CoreError::Internal(msg)) => {
                tracing::error!(error = %msg, "Internal core error");
                internal(msg)
            }
            AppError::Core(core) => (
                StatusCode::OK,
                ErrorBody::new(core.status_code(), core.to_string()),
            ),

            AppError::Validation(errors) => {
                let fields = field_messages(&errors);
                let message = fields
                    .values()
                    .flatten()
                    .next()
                    .cloned()
                    .unwrap_or_else(|| "Invalid request".to_string());
                (
                    StatusCode::BAD_REQUEST,
                    ErrorBody {
                        status: 400,
                        message,
                        errors: Some(fields),
                    },
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorBody::new(400, msg)),

            AppError::Unauthenticated => (
                StatusCode::FORBIDDEN,
                ErrorBody::new(403, UNAUTHENTICATED_MESSAGE),
            ),

            AppError::Database(err) => classify_sqlx_error(err),

            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal(msg)
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

fn internal(message: String) -> (StatusCode, ErrorBody) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ErrorBody::new(500, message),
    )
}

/// Flatten validator output into `field -> [messages]`, sorted by field.
fn field_messages(errors: &validator::ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{field} is invalid"),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

/// Classify a sqlx error into an HTTP status and body.
///
/// - `RowNotFound` maps to a domain 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map
///   to a domain 409, which covers the race between check and insert.
/// - Everything else maps to 500.
fn classify_sqlx_error(err: sqlx::Error) -> (StatusCode, ErrorBody) {
    match &err {
        sqlx::Error::RowNotFound => (StatusCode::OK, ErrorBody::new(404, "Resource not found")),
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            let constraint = db_err.constraint().unwrap_or("unknown");
            if constraint.starts_with("uq_") {
                return (
                    StatusCode::OK,
                    ErrorBody::new(
                        409,
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    ),
                );
            }
            tracing::error!(error = %db_err, "Database error");
            internal(format!("Database error: {db_err}"))
        }
        other => {
            tracing::error!(error = %other, "Database error");
            internal(format!("Database error: {other}"))
        }
    }
}

/// Map a write that lost the race against one of `constraints` to the same
/// domain conflict the handler's own check reports. Other errors pass
/// through unchanged.
///
/// ```ignore
/// DashboardRepo::create(&pool, owner_id, &input)
///     .await
///     .map_err(conflict_on(&[constraints::DASHBOARDS_OWNER_NAME], NAME_TAKEN))?;
/// ```
pub fn conflict_on(
    constraints: &'static [&'static str],
    message: &'static str,
) -> impl FnOnce(sqlx::Error) -> AppError {
    move |err| {
        if dashhub_db::constraints::violates(&err, constraints) {
            tracing::debug!(error = %err, "Uniqueness check lost a race");
            CoreError::Conflict(message.into()).into()
        } else {
            err.into()
        }
    }
}

/// Response mapper installed on the whole router: in production, replace
/// the body of every 500 with [`REDACTED_MESSAGE`].
pub async fn redact_internal_errors(State(state): State<AppState>, response: Response) -> Response {
    if state.config.environment.is_production() {
        redact(response)
    } else {
        response
    }
}

/// Replace the body of a 500 response with the fixed production message.
pub fn redact(response: Response) -> Response {
    if response.status() != StatusCode::INTERNAL_SERVER_ERROR {
        return response;
    }
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        axum::Json(ErrorBody::new(500, REDACTED_MESSAGE)),
    )
        .into_response()
}
