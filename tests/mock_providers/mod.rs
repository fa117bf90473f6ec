//! Shared test infrastructure: mock upstream providers and config builders.

#![allow(dead_code)]

pub mod agent_mock;
pub mod http_mock;

use callbridge_gateway::config::ServerConfig;

/// Minimal gateway configuration pointing every upstream at test servers.
///
/// Uses the static-access-token store auth mode so no OAuth exchange is
/// needed; the Firestore mock just expects a bearer header.
pub fn create_test_config(
    firestore_base: &str,
    twilio_base: &str,
    elevenlabs_base: &str,
) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        tls: None,
        public_host: None,
        jwt_secret: "test-signing-secret".to_string(),
        allowed_origins: None,
        firebase_project_id: "test-project".to_string(),
        google_application_credentials: None,
        firestore_access_token: Some("test-store-token".to_string()),
        twilio_api_base: twilio_base.trim_end_matches('/').to_string(),
        elevenlabs_api_base: elevenlabs_base.trim_end_matches('/').to_string(),
        firestore_api_base: firestore_base.trim_end_matches('/').to_string(),
        google_oauth_token_url: "http://127.0.0.1:1/token".to_string(),
        rate_limit_requests_per_second: 100000,
        rate_limit_burst_size: 100,
    }
}
