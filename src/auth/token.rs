//! Signed access token issuance and verification.
//!
//! Tokens are HS256 JWTs with a fixed one-hour expiry, tagging the caller as
//! one of two known sources. They are stateless: validity is determined by
//! signature and expiry alone, with no revocation or replay tracking. They
//! authenticate transport-layer access only and are not tied to any call.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::errors::auth_error::{AuthError, AuthResult};

/// Token lifetime in seconds (one hour).
pub const TOKEN_TTL_SECS: u64 = 3600;

/// The two caller classes a token may tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallerSource {
    Frontend,
    Backend,
}

impl CallerSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallerSource::Frontend => "frontend",
            CallerSource::Backend => "backend",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "frontend" => Some(CallerSource::Frontend),
            "backend" => Some(CallerSource::Backend),
            _ => None,
        }
    }
}

impl std::fmt::Display for CallerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub source: CallerSource,
    pub iat: u64,
    pub exp: u64,
}

/// Auth context inserted into request extensions by the auth middleware.
#[derive(Debug, Clone)]
pub struct Auth {
    pub source: CallerSource,
}

/// Issues and verifies signed access tokens.
///
/// Constructed once at startup from the configured signing secret and shared
/// through `AppState`.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    /// Create a token service from the signing secret.
    ///
    /// An empty secret is a configuration error; `ServerConfig::from_env`
    /// rejects it before this runs, so hitting it here means the service was
    /// constructed without going through config validation.
    pub fn new(secret: &str) -> AuthResult<Self> {
        if secret.is_empty() {
            return Err(AuthError::ConfigError(
                "Token signing secret is not configured".to_string(),
            ));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // Exact expiry: a token issued an hour ago is invalid, not "close enough".
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Issue a token for the given caller source, expiring in one hour.
    pub fn issue(&self, source: CallerSource) -> AuthResult<String> {
        self.issue_at(source, jsonwebtoken::get_current_timestamp())
    }

    fn issue_at(&self, source: CallerSource, issued_at: u64) -> AuthResult<String> {
        let claims = TokenClaims {
            source,
            iat: issued_at,
            exp: issued_at + TOKEN_TTL_SECS,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|_| AuthError::ConfigError("Failed to sign token".to_string()))
    }

    /// Verify a token, returning its claims.
    ///
    /// Fails with `InvalidToken` on a bad signature, wrong algorithm, or
    /// expiry; callers do not learn which.
    pub fn verify(&self, token: &str) -> AuthResult<TokenClaims> {
        decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }
}
