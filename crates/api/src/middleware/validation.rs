//! Request body and query extraction with schema validation.
//!
//! - [`ValidatedJson`] deserializes a JSON body and runs its `Validate` impl.
//! - [`JsonBody`] and [`QueryParams`] only deserialize.
//!
//! All three reject with [`AppError`], so malformed input produces the same
//! `{status: 400, message}` body as every other failure.

use std::borrow::Cow;
use std::fmt;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use dashhub_core::rules::{normalize_email, normalize_text, MIN_PASSWORD_LENGTH};
use dashhub_core::types::DbId;
use serde::de::{self, DeserializeOwned, Visitor};
use serde::{Deserialize, Deserializer};
use validator::{Validate, ValidateEmail, ValidationError};

use crate::error::AppError;

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

/// JSON body that passed its schema.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let JsonBody(value) = JsonBody::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// JSON body without a schema.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(json_rejection)?;
        Ok(JsonBody(value))
    }
}

fn json_rejection(rejection: JsonRejection) -> AppError {
    tracing::debug!(error = %rejection, "Rejected JSON body");
    AppError::BadRequest(rejection.body_text())
}

/// Query string parameters.
#[derive(Debug)]
pub struct QueryParams<T>(pub T);

impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: QueryRejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(QueryParams(value))
    }
}

// ---------------------------------------------------------------------------
// Field rules
// ---------------------------------------------------------------------------

fn error(code: &'static str, message: String) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Owned(message))
}

fn required(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(error("required", format!("{field} is a required field")));
    }
    Ok(())
}

pub fn validate_username(value: &str) -> Result<(), ValidationError> {
    required("username", value)
}

/// Required, and at least [`MIN_PASSWORD_LENGTH`] characters after trimming.
pub fn validate_password(value: &str) -> Result<(), ValidationError> {
    required("password", value)?;
    validate_password_length(value)
}

pub fn validate_password_length(value: &str) -> Result<(), ValidationError> {
    if (value.chars().count() as u64) < MIN_PASSWORD_LENGTH {
        return Err(error(
            "min",
            format!("password must be at least {MIN_PASSWORD_LENGTH} characters"),
        ));
    }
    Ok(())
}

pub fn validate_email(value: &str) -> Result<(), ValidationError> {
    required("email", value)?;
    if !value.validate_email() {
        return Err(error("email", "email must be a valid email".to_string()));
    }
    Ok(())
}

/// Holds when at least one of the two optional fields is present.
pub fn require_any(a: Option<&str>, b: Option<&str>) -> Result<(), ValidationError> {
    if a.is_none() && b.is_none() {
        return Err(error("missing", "Missing parameters".to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Normalising deserializers
// ---------------------------------------------------------------------------

/// Trim surrounding whitespace.
pub fn trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = String::deserialize(deserializer)?;
    Ok(normalize_text(&value))
}

/// Trim surrounding whitespace of an optional string.
pub fn trimmed_opt<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(|v| normalize_text(&v)))
}

/// Trim and lower-case (e-mail addresses).
pub fn lowercase_trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = String::deserialize(deserializer)?;
    Ok(normalize_email(&value))
}

/// A row id given either as a JSON number or as a numeric string.
pub fn db_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DbId, D::Error> {
    struct IdVisitor;

    impl Visitor<'_> for IdVisitor {
        type Value = DbId;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an integer id or a numeric string")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<DbId, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<DbId, E> {
            DbId::try_from(v).map_err(|_| E::custom("id out of range"))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<DbId, E> {
            v.trim()
                .parse()
                .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize, Validate)]
    struct Register {
        #[serde(default, deserialize_with = "trimmed")]
        #[validate(custom(function = "validate_username"))]
        username: String,
        #[serde(default, deserialize_with = "lowercase_trimmed")]
        #[validate(custom(function = "validate_email"))]
        email: String,
        #[serde(default, deserialize_with = "trimmed")]
        #[validate(custom(function = "validate_password"))]
        password: String,
    }

    #[derive(Debug, Deserialize)]
    struct WithId {
        #[serde(deserialize_with = "db_id")]
        id: DbId,
    }

    fn messages(errors: &validator::ValidationErrors, field: &str) -> Vec<String> {
        errors.field_errors()[field]
            .iter()
            .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .collect()
    }

    #[test]
    fn normalises_before_validating() {
        let body: Register = serde_json::from_value(serde_json::json!({
            "username": "  maria ",
            "email": " Maria@Example.com ",
            "password": " secret "
        }))
        .unwrap();
        assert_eq!(body.username, "maria");
        assert_eq!(body.email, "maria@example.com");
        assert_eq!(body.password, "secret");
        assert!(body.validate().is_ok());
    }

    #[test]
    fn missing_fields_are_required() {
        let body: Register = serde_json::from_value(serde_json::json!({})).unwrap();
        let errors = body.validate().unwrap_err();
        assert_eq!(messages(&errors, "username"), ["username is a required field"]);
        assert_eq!(messages(&errors, "email"), ["email is a required field"]);
        assert_eq!(messages(&errors, "password"), ["password is a required field"]);
    }

    #[test]
    fn short_password_and_bad_email() {
        let body: Register = serde_json::from_value(serde_json::json!({
            "username": "maria",
            "email": "not-an-email",
            "password": " abcd    "
        }))
        .unwrap();
        let errors = body.validate().unwrap_err();
        assert_eq!(
            messages(&errors, "password"),
            ["password must be at least 5 characters"]
        );
        assert_eq!(messages(&errors, "email"), ["email must be a valid email"]);
        assert!(!errors.field_errors().contains_key("username"));
    }

    #[test]
    fn ids_accept_numbers_and_numeric_strings() {
        let a: WithId = serde_json::from_str(r#"{"id": 7}"#).unwrap();
        let b: WithId = serde_json::from_str(r#"{"id": "7"}"#).unwrap();
        assert_eq!(a.id, 7);
        assert_eq!(b.id, 7);
        assert!(serde_json::from_str::<WithId>(r#"{"id": "seven"}"#).is_err());
        assert!(serde_json::from_str::<WithId>(r#"{"id": true}"#).is_err());
    }

    #[test]
    fn require_any_needs_one_field() {
        assert!(require_any(None, None).is_err());
        assert!(require_any(Some("maria"), None).is_ok());
        assert!(require_any(None, Some("secret")).is_ok());
    }
}
