//! Request pre-processing shared by the route handlers.
//!
//! - [`auth::require_auth`] / [`auth::optional_auth`] -- token lookup and verification.
//! - [`auth::AuthUser`], [`auth::MaybeAuthUser`], [`auth::ResetGrant`] -- extractors over the verified token.
//! - [`validation::ValidatedJson`] -- JSON body checked against its schema.

pub mod auth;
pub mod validation;
