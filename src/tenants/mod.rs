//! Per-tenant credential resolution.
//!
//! Tenant records live in an external document store (Firestore); this
//! module is a pure read path. A credential set is usable only when all five
//! fields are present and non-empty - partial sets are treated as absent and
//! every caller aborts its enclosing operation on failure. Credentials are
//! never cached: the call initiator and the relay session each fetch fresh.

mod firestore;

pub use firestore::FirestoreDirectory;

use async_trait::async_trait;
use thiserror::Error;

/// A tenant's telephony and voice-AI credentials.
///
/// Invariant: all fields non-empty. Constructed only by a `TenantDirectory`
/// after validation.
#[derive(Debug, Clone)]
pub struct TenantCredentials {
    /// Telephony account identifier (Twilio account SID).
    pub twilio_account_sid: String,
    /// Telephony API key (Twilio auth token / API key secret).
    pub twilio_api_key: String,
    /// The tenant's provisioned outbound caller number.
    pub twilio_phone_number: String,
    /// Voice-AI API key.
    pub elevenlabs_api_key: String,
    /// Voice-AI conversational agent identifier.
    pub elevenlabs_agent_id: String,
}

/// Credential resolution failures.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("User document not found for user ID: {tenant_id}")]
    NotFound { tenant_id: String },

    #[error("Missing required credentials for user {tenant_id}: {}", missing.join(", "))]
    Incomplete {
        tenant_id: String,
        missing: Vec<&'static str>,
    },

    #[error("Credential store error: {0}")]
    Store(String),
}

pub type CredentialResult<T> = Result<T, CredentialError>;

/// Read-only directory of tenant credential sets.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    /// Resolve a tenant's complete credential set, or fail.
    async fn resolve(&self, tenant_id: &str) -> CredentialResult<TenantCredentials>;
}
