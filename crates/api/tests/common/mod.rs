#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use dashhub_api::auth::jwt::JwtConfig;
use dashhub_api::config::{Environment, ServerConfig};
use dashhub_api::mail::{MailError, Mailer, OutgoingMail};
use dashhub_api::router::build_app_router;
use dashhub_api::state::AppState;

pub const TEST_SECRET: &str = "integration-test-secret-long-enough";
pub const RESET_URL_BASE: &str = "http://hub.test/reset?token=";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        environment: Environment::Development,
        index_file: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../../public/index.html")),
        reset_url_base: RESET_URL_BASE.to_string(),
        jwt: test_jwt_config(),
        email: None,
    }
}

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: TEST_SECRET.to_string(),
        access_token_expiry_mins: 15,
        reset_token_expiry_mins: 5,
    }
}

/// Mailer that keeps every message in memory.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingMail>>,
}

impl RecordingMailer {
    pub fn last(&self) -> Option<OutgoingMail> {
        self.sent.lock().unwrap().last().cloned()
    }

    /// Token from the reset link of the last message.
    pub fn last_reset_token(&self) -> Option<String> {
        let mail = self.last()?;
        let start = mail.body.find(RESET_URL_BASE)? + RESET_URL_BASE.len();
        mail.body[start..].split_whitespace().next().map(str::to_string)
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

/// Application under test plus the mailer it sends through.
pub struct TestApp {
    pub router: Router,
    pub mailer: Arc<RecordingMailer>,
}

pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> TestApp {
    let mailer = Arc::new(RecordingMailer::default());
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        mailer: mailer.clone(),
        http: reqwest::Client::new(),
    };
    TestApp {
        router: build_app_router(state, &config),
        mailer,
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
pub fn build_test_app(pool: PgPool) -> TestApp {
    build_test_app_with(pool, test_config())
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn get_auth(app: &Router, uri: &str, token: &str) -> Response {
    let request = Request::get(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: &Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Send and expect HTTP 200, returning the JSON body.
pub async fn ok_json(response: Response) -> serde_json::Value {
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

// ---------------------------------------------------------------------------
// Account helpers
// ---------------------------------------------------------------------------

/// A registered, signed-in user.
pub struct Account {
    pub id: i64,
    pub username: String,
    pub token: String,
}

/// Register `username` through the API and sign in.
pub async fn sign_up(app: &Router, username: &str) -> Account {
    let password = format!("{username}-password");
    let created = ok_json(
        post_json(
            app,
            "/users/create",
            serde_json::json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": password,
            }),
        )
        .await,
    )
    .await;
    assert_eq!(created["success"], true, "registration failed: {created}");

    let auth = ok_json(
        post_json(
            app,
            "/users/authenticate",
            serde_json::json!({ "username": username, "password": password }),
        )
        .await,
    )
    .await;

    Account {
        id: auth["user"]["id"].as_i64().unwrap(),
        username: username.to_string(),
        token: auth["token"].as_str().unwrap().to_string(),
    }
}
