//! Gateway configuration loaded from environment variables.
//!
//! Everything is read exactly once at startup and never consulted from the
//! environment again; request handling only sees the immutable
//! [`StorefrontConfig`] held in application state.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `NODE_ENV` - `production` enables production mode (default: development)
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 5000)
//! - `MONGO_URI` - Connection string handed to the persistence collaborator
//! - `PAYPAL_CLIENT_ID` - Disclosed by `GET /api/config/paypal`
//! - `CORS_ORIGIN` - The single origin granted credentialed CORS (default: `http://localhost:3000`)
//! - `CSP_PAYMENT_ORIGIN` - Third-party payment source allowed by the CSP (default: `*.paypal.com`)
//! - `UPLOADS_DIR` - Root for `/uploads` (default: `uploads`)
//! - `CLIENT_BUILD_DIR` - Prebuilt client application root (default: `frontend/build`)
//! - `BODY_LIMIT_BYTES` - Max JSON/form body size (default: 102400)
//! - `REQUEST_TIMEOUT_SECS` - Per-request timeout; unset disables it
//! - `LOG_FORMAT` - `json` for structured output, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag (default: `NODE_ENV` mode)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use axum::http::HeaderValue;
use proshop_core::DeploymentMode;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Request bodies larger than this are rejected unless overridden.
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 100 * 1024;

const DEFAULT_PORT: &str = "5000";
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_PAYMENT_ORIGIN: &str = "*.paypal.com";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Development or production behavior, fixed for the process lifetime
    pub mode: DeploymentMode,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Persistence connection string (contains credentials)
    pub mongo_uri: Option<SecretString>,
    /// PayPal client ID returned to browsers
    pub paypal_client_id: Option<String>,
    /// The one origin that receives permissive CORS headers
    pub cors_origin: HeaderValue,
    /// Payment provider source list entry for the CSP
    pub payment_origin: String,
    /// Directory served under `/uploads`
    pub uploads_dir: PathBuf,
    /// Prebuilt client application served in production
    pub client_build_dir: PathBuf,
    /// Maximum decoded body size in bytes
    pub body_limit: usize,
    /// Optional per-request deadline
    pub request_timeout: Option<Duration>,
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let mode = DeploymentMode::from_node_env(vars.optional("NODE_ENV").as_deref());
        let host = vars
            .or_default("HOST", "0.0.0.0")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_string(), e.to_string()))?;
        let port = vars
            .or_default("PORT", DEFAULT_PORT)
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;
        let cors_origin = parse_origin(&vars.or_default("CORS_ORIGIN", DEFAULT_CORS_ORIGIN))?;
        let body_limit = parse_body_limit(vars.optional("BODY_LIMIT_BYTES"))?;
        let request_timeout = parse_timeout(vars.optional("REQUEST_TIMEOUT_SECS"))?;
        let log_format = match vars.optional("LOG_FORMAT").as_deref() {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            mode,
            host,
            port,
            mongo_uri: vars.optional("MONGO_URI").map(SecretString::from),
            paypal_client_id: vars.optional("PAYPAL_CLIENT_ID"),
            cors_origin,
            payment_origin: vars.or_default("CSP_PAYMENT_ORIGIN", DEFAULT_PAYMENT_ORIGIN),
            uploads_dir: PathBuf::from(vars.or_default("UPLOADS_DIR", "uploads")),
            client_build_dir: PathBuf::from(vars.or_default("CLIENT_BUILD_DIR", "frontend/build")),
            body_limit,
            request_timeout,
            log_format,
            sentry_dsn: vars.optional("SENTRY_DSN"),
            sentry_environment: vars.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Path of the single-page application's entry document.
    #[must_use]
    pub fn client_index(&self) -> PathBuf {
        self.client_build_dir.join("index.html")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }
}

/// An origin must be a bare `scheme://host[:port]` with no path.
fn parse_origin(raw: &str) -> Result<HeaderValue, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar("CORS_ORIGIN".to_string(), reason);

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    let origin = url.origin().ascii_serialization();
    if origin.trim_end_matches('/') != raw.trim_end_matches('/') {
        return Err(invalid(format!("expected a bare origin like {origin}")));
    }
    HeaderValue::from_str(&origin).map_err(|e| invalid(e.to_string()))
}

fn parse_body_limit(raw: Option<String>) -> Result<usize, ConfigError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_BODY_LIMIT_BYTES);
    };
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(ConfigError::InvalidEnvVar(
            "BODY_LIMIT_BYTES".to_string(),
            "must be greater than zero".to_string(),
        )),
        Ok(limit) => Ok(limit),
        Err(e) => Err(ConfigError::InvalidEnvVar(
            "BODY_LIMIT_BYTES".to_string(),
            e.to_string(),
        )),
    }
}

fn parse_timeout(raw: Option<String>) -> Result<Option<Duration>, ConfigError> {
    raw.map(|raw| {
        raw.trim()
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or_else(|| {
                ConfigError::InvalidEnvVar(
                    "REQUEST_TIMEOUT_SECS".to_string(),
                    format!("expected a positive number of seconds, got '{raw}'"),
                )
            })
    })
    .transpose()
}
