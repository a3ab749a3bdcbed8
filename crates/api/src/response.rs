//! Shared response envelope types for API handlers.
//!
//! Successful responses carry `"success": true` next to the payload fields.
//! Use [`Success`] instead of ad-hoc `serde_json::json!` bodies to get
//! compile-time type safety and consistent serialization.

use axum::Json;
use serde::Serialize;

/// `{ "success": true, ...body }` response envelope.
///
/// ```ignore
/// Ok(Success::new(DashboardList { dashboards }))
/// ```
#[derive(Debug, Serialize)]
pub struct Success<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

impl<T: Serialize> Success<T> {
    pub fn new(body: T) -> Json<Self> {
        Json(Self {
            success: true,
            body,
        })
    }
}

/// Payload for endpoints that only acknowledge success.
#[derive(Debug, Serialize)]
pub struct Empty {}

/// Plain `{ "success": true }`.
pub fn ok() -> Json<Success<Empty>> {
    Success::new(Empty {})
}

/// `{ "ok": true, "message": ... }`, used by the password reset flow.
#[derive(Debug, Serialize)]
pub struct Acknowledged {
    pub ok: bool,
    pub message: &'static str,
}

impl Acknowledged {
    pub fn new(message: &'static str) -> Json<Self> {
        Json(Self { ok: true, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_flattens_payload() {
        #[derive(Serialize)]
        struct Shared {
            shared: bool,
        }

        let Json(body) = Success::new(Shared { shared: true });
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(value, serde_json::json!({ "success": true, "shared": true }));
    }

    #[test]
    fn ok_is_bare_success() {
        let Json(body) = ok();
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(value, serde_json::json!({ "success": true }));
    }
}
