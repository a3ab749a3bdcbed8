//! Handlers for data source connection settings.

use std::collections::HashSet;
use std::fmt;

use axum::extract::State;
use axum::Json;
use dashhub_core::error::CoreError;
use dashhub_core::rules::DEFAULT_SOURCE_TYPE;
use dashhub_core::types::DbId;
use dashhub_db::constraints;
use dashhub_db::models::source::{Source, SourceFields};
use dashhub_db::repositories::SourceRepo;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{conflict_on, AppError, AppResult};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::middleware::validation::{db_id, JsonBody};
use crate::response::{ok, Empty, Success};
use crate::state::AppState;

const NAME_TAKEN: &str = "A source with that name already exists.";
const SAME_NAME_FOUND: &str = "A source with the same name has been found.";
const NOT_FOUND: &str = "The selected source has not been found.";

fn source_missing() -> AppError {
    CoreError::Missing(NOT_FOUND.into()).into()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

fn default_source_type() -> String {
    DEFAULT_SOURCE_TYPE.to_string()
}

/// Connection settings as sent by the client.
#[derive(Debug, Deserialize)]
pub struct SourceBody {
    pub name: String,
    #[serde(rename = "type", default = "default_source_type")]
    pub source_type: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub passcode: String,
    #[serde(default)]
    pub vhost: String,
}

impl From<SourceBody> for SourceFields {
    fn from(b: SourceBody) -> Self {
        Self {
            name: b.name,
            source_type: b.source_type,
            url: b.url,
            login: b.login,
            passcode: b.passcode,
            vhost: b.vhost,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChangeSourceRequest {
    #[serde(deserialize_with = "db_id")]
    pub id: DbId,
    #[serde(flatten)]
    pub fields: SourceBody,
}

#[derive(Debug, Deserialize)]
pub struct DeleteSourceRequest {
    #[serde(deserialize_with = "db_id")]
    pub id: DbId,
}

/// Whose source to look up: `"self"` or a user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOwner {
    Myself,
    User(DbId),
}

impl<'de> Deserialize<'de> for SourceOwner {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OwnerVisitor;

        impl Visitor<'_> for OwnerVisitor {
            type Value = SourceOwner;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("\"self\" or a user id")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<SourceOwner, E> {
                Ok(SourceOwner::User(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<SourceOwner, E> {
                DbId::try_from(v)
                    .map(SourceOwner::User)
                    .map_err(|_| E::custom("user id out of range"))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<SourceOwner, E> {
                if v == "self" {
                    return Ok(SourceOwner::Myself);
                }
                v.parse()
                    .map(SourceOwner::User)
                    .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
            }
        }

        deserializer.deserialize_any(OwnerVisitor)
    }
}

#[derive(Debug, Deserialize)]
pub struct SourceLookupRequest {
    pub name: String,
    pub owner: SourceOwner,
}

#[derive(Debug, Deserialize)]
pub struct CheckSourcesRequest {
    pub sources: Vec<String>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SourceSummary {
    pub id: DbId,
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: String,
    pub url: String,
    pub login: String,
    pub passcode: String,
    pub vhost: String,
    /// Connection state is tracked client-side; always `false` here.
    pub active: bool,
}

impl From<Source> for SourceSummary {
    fn from(s: Source) -> Self {
        Self {
            id: s.id,
            name: s.name,
            source_type: s.source_type,
            url: s.url,
            login: s.login,
            passcode: s.passcode,
            vhost: s.vhost,
            active: false,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SourceList {
    pub sources: Vec<SourceSummary>,
}

#[derive(Debug, Serialize)]
pub struct ConnectionSettings {
    #[serde(rename = "type")]
    pub source_type: String,
    pub url: String,
    pub login: String,
    pub passcode: String,
    pub vhost: String,
}

#[derive(Debug, Serialize)]
pub struct SourceLookup {
    pub source: ConnectionSettings,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedSources {
    pub new_sources: Vec<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /sources/sources
pub async fn list_sources(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Success<SourceList>>> {
    let sources = SourceRepo::list_by_owner(&state.pool, auth.user_id)
        .await?
        .into_iter()
        .map(SourceSummary::from)
        .collect();
    Ok(Success::new(SourceList { sources }))
}

/// POST /sources/create-source
pub async fn create_source(
    auth: AuthUser,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<SourceBody>,
) -> AppResult<Json<Success<Empty>>> {
    if SourceRepo::name_taken(&state.pool, auth.user_id, &input.name, None).await? {
        return Err(CoreError::Conflict(NAME_TAKEN.into()).into());
    }

    let source = SourceRepo::create(&state.pool, auth.user_id, &input.into())
        .await
        .map_err(conflict_on(&[constraints::SOURCES_OWNER_NAME], NAME_TAKEN))?;

    tracing::info!(
        source_id = source.id,
        user_id = auth.user_id,
        name = %source.name,
        "Source created",
    );

    Ok(ok())
}

/// POST /sources/change-source
///
/// Replace all connection settings; the new name must not belong to another
/// of the owner's sources.
pub async fn change_source(
    auth: AuthUser,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<ChangeSourceRequest>,
) -> AppResult<Json<Success<Empty>>> {
    SourceRepo::find_owned(&state.pool, input.id, auth.user_id)
        .await?
        .ok_or_else(source_missing)?;

    if SourceRepo::name_taken(&state.pool, auth.user_id, &input.fields.name, Some(input.id)).await?
    {
        return Err(CoreError::Conflict(SAME_NAME_FOUND.into()).into());
    }

    SourceRepo::update(&state.pool, input.id, auth.user_id, &input.fields.into())
        .await
        .map_err(conflict_on(&[constraints::SOURCES_OWNER_NAME], SAME_NAME_FOUND))?
        .ok_or_else(source_missing)?;

    tracing::info!(source_id = input.id, user_id = auth.user_id, "Source updated");

    Ok(ok())
}

/// POST /sources/delete-source
pub async fn delete_source(
    auth: AuthUser,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<DeleteSourceRequest>,
) -> AppResult<Json<Success<Empty>>> {
    if !SourceRepo::delete_owned(&state.pool, input.id, auth.user_id).await? {
        return Err(source_missing());
    }

    tracing::info!(source_id = input.id, user_id = auth.user_id, "Source deleted");

    Ok(ok())
}

/// POST /sources/source
///
/// Connection settings of a source by name, used when rendering a shared
/// dashboard. `"self"` needs a signed-in requester.
pub async fn get_source(
    MaybeAuthUser(requester): MaybeAuthUser,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<SourceLookupRequest>,
) -> AppResult<Json<Success<SourceLookup>>> {
    let owner_id = match input.owner {
        SourceOwner::Myself => requester.ok_or(AppError::Unauthenticated)?.user_id,
        SourceOwner::User(id) => id,
    };

    let source = SourceRepo::find_by_name(&state.pool, owner_id, &input.name)
        .await?
        .ok_or_else(source_missing)?;

    Ok(Success::new(SourceLookup {
        source: ConnectionSettings {
            source_type: source.source_type,
            url: source.url,
            login: source.login,
            passcode: source.passcode,
            vhost: source.vhost,
        },
    }))
}

/// POST /sources/check-sources
///
/// Make sure every named source exists, creating empty default ones for
/// the names the owner does not have yet.
pub async fn check_sources(
    auth: AuthUser,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CheckSourcesRequest>,
) -> AppResult<Json<Success<CreatedSources>>> {
    let mut seen = HashSet::new();
    let names: Vec<String> = input
        .sources
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect();

    let new_sources = SourceRepo::create_missing(&state.pool, auth.user_id, &names).await?;

    if !new_sources.is_empty() {
        tracing::info!(
            user_id = auth.user_id,
            count = new_sources.len(),
            "Default sources created",
        );
    }

    Ok(Success::new(CreatedSources { new_sources }))
}
