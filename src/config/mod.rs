//! Configuration module for the Callbridge gateway
//!
//! Configuration is environment-driven: values come from process environment
//! variables, with a `.env` file loaded by `main` before this module runs.
//! The signing secret is a fatal startup requirement; everything else either
//! has a default or is validated when first used.

use std::env;
use std::path::PathBuf;

use thiserror::Error;

/// Default Twilio REST API base URL.
pub const DEFAULT_TWILIO_API_BASE: &str = "https://api.twilio.com";

/// Default ElevenLabs REST API base URL (signed-URL endpoint).
pub const DEFAULT_ELEVENLABS_API_BASE: &str = "https://api.elevenlabs.io";

/// Default Firestore REST API base URL.
pub const DEFAULT_FIRESTORE_API_BASE: &str = "https://firestore.googleapis.com";

/// Default Google OAuth2 token endpoint.
pub const DEFAULT_GOOGLE_OAUTH_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// TLS configuration for HTTPS and WSS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// Configuration load/validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {var}: {message}")]
    InvalidVar { var: &'static str, message: String },

    #[error(
        "No Firestore credentials configured: set GOOGLE_APPLICATION_CREDENTIALS \
         or FIRESTORE_ACCESS_TOKEN"
    )]
    MissingStoreCredentials,
}

/// Server configuration
///
/// Contains everything needed to run the gateway:
/// - Server settings (host, port, optional TLS, public callback host)
/// - Token signing secret (required; startup fails without it)
/// - Streaming origin allow-list (also drives CORS)
/// - Firestore project and credentials for tenant lookups
/// - Upstream base URLs (overridable for tests and private deployments)
/// - Rate limiting knobs for the control plane
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    /// Host used when building carrier callback and stream URLs.
    /// Falls back to the request `Host` header when unset (direct exposure,
    /// no proxy in front).
    pub public_host: Option<String>,

    /// HS256 signing secret for access tokens. Required.
    pub jwt_secret: String,

    /// Allow-list of caller origins for the streaming endpoints, comma
    /// separated, or "*" to allow any. Also used as the CORS allow-list.
    /// Unset disables the origin gate (same-origin CORS only).
    pub allowed_origins: Option<String>,

    // Tenant document store
    /// Firebase project holding the tenant documents.
    pub firebase_project_id: String,
    /// Path to a service-account JSON file used to mint OAuth access tokens.
    pub google_application_credentials: Option<PathBuf>,
    /// Static OAuth access token for the document store. Intended for local
    /// development (`gcloud auth print-access-token`) and tests.
    pub firestore_access_token: Option<String>,

    // Upstream base URLs
    pub twilio_api_base: String,
    pub elevenlabs_api_base: String,
    pub firestore_api_base: String,
    pub google_oauth_token_url: String,

    // Rate limiting configuration
    /// Maximum requests per second per IP address. Default: 60.
    pub rate_limit_requests_per_second: u32,
    /// Maximum burst size for rate limiting. Default: 10.
    pub rate_limit_burst_size: u32,
}

/// Implement Drop to zeroize secret fields when ServerConfig is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        self.jwt_secret.zeroize();
        if let Some(ref mut token) = self.firestore_access_token {
            token.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_var("PORT", 8000u16)?;

        let tls = match (env::var("TLS_CERT_PATH"), env::var("TLS_KEY_PATH")) {
            (Ok(cert), Ok(key)) => Some(TlsConfig {
                cert_path: PathBuf::from(cert),
                key_path: PathBuf::from(key),
            }),
            _ => None,
        };

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::MissingVar("JWT_SECRET"))?;
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::InvalidVar {
                var: "JWT_SECRET",
                message: "must not be empty".to_string(),
            });
        }

        let firebase_project_id = env::var("FIREBASE_PROJECT_ID")
            .map_err(|_| ConfigError::MissingVar("FIREBASE_PROJECT_ID"))?;

        let google_application_credentials =
            env::var("GOOGLE_APPLICATION_CREDENTIALS").ok().map(PathBuf::from);
        let firestore_access_token = non_empty(env::var("FIRESTORE_ACCESS_TOKEN").ok());

        if google_application_credentials.is_none() && firestore_access_token.is_none() {
            return Err(ConfigError::MissingStoreCredentials);
        }

        let config = Self {
            host,
            port,
            tls,
            public_host: non_empty(env::var("PUBLIC_HOST").ok()),
            jwt_secret,
            allowed_origins: non_empty(env::var("ALLOWED_ORIGINS").ok()),
            firebase_project_id,
            google_application_credentials,
            firestore_access_token,
            twilio_api_base: base_url("TWILIO_API_BASE", DEFAULT_TWILIO_API_BASE),
            elevenlabs_api_base: base_url("ELEVENLABS_API_BASE", DEFAULT_ELEVENLABS_API_BASE),
            firestore_api_base: base_url("FIRESTORE_API_BASE", DEFAULT_FIRESTORE_API_BASE),
            google_oauth_token_url: env::var("GOOGLE_OAUTH_TOKEN_URL")
                .unwrap_or_else(|_| DEFAULT_GOOGLE_OAUTH_TOKEN_URL.to_string()),
            rate_limit_requests_per_second: parse_var("RATE_LIMIT_RPS", 60u32)?,
            rate_limit_burst_size: parse_var("RATE_LIMIT_BURST", 10u32)?,
        };

        Ok(config)
    }

    /// The socket address string the server binds to.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Origins allowed to open streaming sockets. `None` means the gate is
    /// disabled; an empty vec means a list was configured but parsed empty
    /// (nothing is allowed).
    pub fn origin_allow_list(&self) -> Option<Vec<String>> {
        let raw = self.allowed_origins.as_deref()?;
        if raw == "*" {
            return None;
        }
        Some(
            raw.split(',')
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }
}

fn parse_var<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidVar {
            var,
            message: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn base_url(var: &str, default: &str) -> String {
    env::var(var)
        .map(|v| v.trim_end_matches('/').to_string())
        .unwrap_or_else(|_| default.to_string())
}
