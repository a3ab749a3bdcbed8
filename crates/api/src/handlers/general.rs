//! Public utility endpoints: platform statistics and URL checks.
//!
//! The checks never fail at the HTTP level. Upstream errors are reported
//! inside the body with status 500, the same shape clients get for success.

use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method};
use axum::Json;
use dashhub_db::models::stats::PlatformStats;
use dashhub_db::repositories::StatsRepo;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::validation::QueryParams;
use crate::response::Success;
use crate::state::AppState;

/// Body text returned for an unsupported `type`.
const UNSUPPORTED_METHOD: &str = "Something went wrong";

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// GET /general/statistics
pub async fn statistics(State(state): State<AppState>) -> AppResult<Json<Success<PlatformStats>>> {
    let stats = StatsRepo::platform_totals(&state.pool).await?;
    Ok(Success::new(stats))
}

// ---------------------------------------------------------------------------
// URL checks
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum UrlCheckError {
    #[error("Missing url")]
    MissingUrl,

    #[error("Invalid JSON in {field}: {source}")]
    InvalidJson {
        field: &'static str,
        source: serde_json::Error,
    },

    #[error("Invalid header {0}")]
    InvalidHeader(String),

    #[error("{0}")]
    Request(#[from] reqwest::Error),
}

#[derive(Debug, Default, Deserialize)]
pub struct TestUrlQuery {
    pub url: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct UrlStatus {
    pub status: u16,
    pub active: bool,
}

/// GET /general/test-url?url=
///
/// Report the upstream status code and whether it was exactly 200.
pub async fn test_url(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<TestUrlQuery>,
) -> Json<UrlStatus> {
    match fetch_status(&state.http, query.url.as_deref()).await {
        Ok(status) => Json(UrlStatus {
            status,
            active: status == 200,
        }),
        Err(e) => {
            tracing::debug!(url = ?query.url, error = %e, "URL status check failed");
            Json(UrlStatus {
                status: 500,
                active: false,
            })
        }
    }
}

async fn fetch_status(client: &reqwest::Client, url: Option<&str>) -> Result<u16, UrlCheckError> {
    let url = url.ok_or(UrlCheckError::MissingUrl)?;
    let response = client.get(url).send().await?;
    Ok(response.status().as_u16())
}

/// Query of `test-url-request`. `headers`, `body` and `params` are
/// JSON-encoded strings.
#[derive(Debug, Default, Deserialize)]
pub struct TestUrlRequestQuery {
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub method: Option<String>,
    pub headers: Option<String>,
    pub body: Option<String>,
    pub params: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct UrlRequestResponse {
    pub status: u16,
    pub response: String,
}

/// GET /general/test-url-request
///
/// Perform a GET, POST or PUT on behalf of the client and return the
/// upstream status and body text.
pub async fn test_url_request(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<TestUrlRequestQuery>,
) -> Json<UrlRequestResponse> {
    let method = match query.method.as_deref() {
        Some("GET") => Method::GET,
        Some("POST") => Method::POST,
        Some("PUT") => Method::PUT,
        other => {
            tracing::debug!(method = ?other, "Unsupported request method");
            return Json(UrlRequestResponse {
                status: 500,
                response: UNSUPPORTED_METHOD.to_string(),
            });
        }
    };

    match forward_request(&state.http, method, &query).await {
        Ok((status, response)) => Json(UrlRequestResponse { status, response }),
        Err(e) => {
            tracing::debug!(url = ?query.url, error = %e, "URL request failed");
            Json(UrlRequestResponse {
                status: 500,
                response: e.to_string(),
            })
        }
    }
}

async fn forward_request(
    client: &reqwest::Client,
    method: Method,
    query: &TestUrlRequestQuery,
) -> Result<(u16, String), UrlCheckError> {
    let url = query.url.as_deref().ok_or(UrlCheckError::MissingUrl)?;
    let headers = parse_headers(query.headers.as_deref())?;

    let mut request = client.request(method.clone(), url).headers(headers);
    if method == Method::GET {
        let params = parse_json_object("params", query.params.as_deref())?;
        let pairs: Vec<(String, String)> = params
            .into_iter()
            .map(|(k, v)| (k, json_to_text(v)))
            .collect();
        request = request.query(&pairs);
    } else {
        let body = match query.body.as_deref() {
            Some(raw) => serde_json::from_str(raw).map_err(|source| UrlCheckError::InvalidJson {
                field: "body",
                source,
            })?,
            None => serde_json::json!({}),
        };
        request = request.json(&body);
    }

    let response = request.send().await?;
    let status = response.status().as_u16();
    let text = response.text().await?;
    Ok((status, text))
}

fn parse_json_object(
    field: &'static str,
    raw: Option<&str>,
) -> Result<serde_json::Map<String, serde_json::Value>, UrlCheckError> {
    match raw {
        Some(raw) => {
            serde_json::from_str(raw).map_err(|source| UrlCheckError::InvalidJson { field, source })
        }
        None => Ok(serde_json::Map::new()),
    }
}

/// Strings are used as-is; other JSON values by their JSON text.
fn json_to_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Build outgoing headers from a JSON object.
pub fn parse_headers(raw: Option<&str>) -> Result<HeaderMap, UrlCheckError> {
    let mut headers = HeaderMap::new();
    for (name, value) in parse_json_object("headers", raw)? {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| UrlCheckError::InvalidHeader(name.clone()))?;
        let value = HeaderValue::from_str(&json_to_text(value))
            .map_err(|_| UrlCheckError::InvalidHeader(name.to_string()))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn headers_from_json() {
        let headers = parse_headers(Some(r#"{"X-Api-Key":"abc","X-Retries":3}"#)).unwrap();
        assert_eq!(headers["x-api-key"], "abc");
        assert_eq!(headers["x-retries"], "3");
        assert!(parse_headers(None).unwrap().is_empty());
    }

    #[test]
    fn bad_headers_are_reported() {
        assert_matches!(
            parse_headers(Some("not json")),
            Err(UrlCheckError::InvalidJson { field: "headers", .. })
        );
        assert_matches!(
            parse_headers(Some(r#"{"bad header":"x"}"#)),
            Err(UrlCheckError::InvalidHeader(_))
        );
    }

    #[test]
    fn json_scalars_become_text() {
        assert_eq!(json_to_text(serde_json::json!("a")), "a");
        assert_eq!(json_to_text(serde_json::json!(1.5)), "1.5");
        assert_eq!(json_to_text(serde_json::json!(true)), "true");
    }
}
