use std::path::PathBuf;

use crate::auth::jwt::JwtConfig;
use crate::mail::EmailConfig;

/// Deployment mode, read from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// `production` (any case) selects [`Environment::Production`]; anything
    /// else, including an unset variable, is development.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for in-flight requests, in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Development or production. Production redacts 500 messages.
    pub environment: Environment,
    /// HTML file served at `/` (default: `public/index.html`).
    pub index_file: PathBuf,
    /// Prefix of the link mailed for password resets; the token is appended.
    pub reset_url_base: String,
    /// JWT token configuration (secret, expiry durations).
    pub jwt: JwtConfig,
    /// SMTP settings; `None` means reset mails are only logged.
    pub email: Option<EmailConfig>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                                 |
    /// |------------------------|-----------------------------------------|
    /// | `HOST`                 | `0.0.0.0`                               |
    /// | `PORT`                 | `3000`                                  |
    /// | `CORS_ORIGINS`         | `http://localhost:3000`                 |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `30`                                    |
    /// | `APP_ENV`              | `development`                           |
    /// | `INDEX_FILE`           | `public/index.html`                     |
    /// | `RESET_URL_BASE`       | `http://localhost:3000/reset?token=`    |
    ///
    /// JWT and SMTP variables are documented on [`JwtConfig::from_env`] and
    /// [`EmailConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let environment = Environment::parse(&std::env::var("APP_ENV").unwrap_or_default());

        let index_file = std::env::var("INDEX_FILE")
            .unwrap_or_else(|_| "public/index.html".into())
            .into();

        let reset_url_base = std::env::var("RESET_URL_BASE")
            .unwrap_or_else(|_| "http://localhost:3000/reset?token=".into());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            environment,
            index_file,
            reset_url_base,
            jwt: JwtConfig::from_env(),
            email: EmailConfig::from_env(),
        }
    }
}
