//! Live-session registry and observer event taps.
//!
//! Each active relay session registers a broadcast tap keyed by its call
//! SID. Observer bridges attach by subscribing to the tap after a tenant
//! check; a lagging observer loses frames rather than slowing the call.

use dashmap::DashMap;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;

/// Frames an observer can lag behind before losing events.
const TAP_CAPACITY: usize = 1024;

/// Normalized `{event, ...}` stream delivered to observer clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum ObserverMessage {
    /// Agent audio as relayed to the carrier, base64.
    #[serde(rename = "audio")]
    Audio { payload: String },

    /// Transcript line from either side of the conversation.
    #[serde(rename = "transcription")]
    Transcription { role: &'static str, text: String },

    /// Conversation metadata from the voice-AI backend.
    #[serde(rename = "metadata")]
    Metadata { payload: Value },
}

/// Why an observer could not attach.
#[derive(Debug, Error)]
pub enum AttachError {
    #[error("No active call session for the given call SID")]
    SessionNotFound,

    #[error("Call session belongs to a different user")]
    TenantMismatch,
}

struct SessionEntry {
    tenant_id: String,
    tap: broadcast::Sender<ObserverMessage>,
}

/// Registry of active relay sessions, keyed by call SID.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, SessionEntry>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session and return its tap sender.
    ///
    /// A session with the same call SID replaces the previous entry; the
    /// carrier never runs two streams for one call.
    pub fn register(&self, call_sid: &str, tenant_id: &str) -> broadcast::Sender<ObserverMessage> {
        let (tap, _) = broadcast::channel(TAP_CAPACITY);
        self.sessions.insert(
            call_sid.to_string(),
            SessionEntry {
                tenant_id: tenant_id.to_string(),
                tap: tap.clone(),
            },
        );
        tap
    }

    /// Subscribe to a session's tap after validating ownership.
    pub fn attach(
        &self,
        call_sid: &str,
        tenant_id: &str,
    ) -> Result<broadcast::Receiver<ObserverMessage>, AttachError> {
        let entry = self.sessions.get(call_sid).ok_or(AttachError::SessionNotFound)?;
        if entry.tenant_id != tenant_id {
            return Err(AttachError::TenantMismatch);
        }
        Ok(entry.tap.subscribe())
    }

    /// Drop a session's entry. Attached observers see their stream end.
    pub fn remove(&self, call_sid: &str) {
        self.sessions.remove(call_sid);
    }

    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_requires_registration() {
        let registry = SessionRegistry::new();
        assert!(matches!(
            registry.attach("CA1", "t1"),
            Err(AttachError::SessionNotFound)
        ));
    }

    #[test]
    fn test_attach_checks_tenant() {
        let registry = SessionRegistry::new();
        let _tap = registry.register("CA1", "t1");

        assert!(matches!(
            registry.attach("CA1", "t2"),
            Err(AttachError::TenantMismatch)
        ));
        assert!(registry.attach("CA1", "t1").is_ok());
    }

    #[tokio::test]
    async fn test_tap_delivers_published_events() {
        let registry = SessionRegistry::new();
        let tap = registry.register("CA1", "t1");
        let mut rx = registry.attach("CA1", "t1").expect("attach");

        tap.send(ObserverMessage::Audio {
            payload: "YWJj".to_string(),
        })
        .expect("send");

        match rx.recv().await.expect("recv") {
            ObserverMessage::Audio { payload } => assert_eq!(payload, "YWJj"),
            other => panic!("Expected Audio, got {other:?}"),
        }
    }

    #[test]
    fn test_remove_detaches() {
        let registry = SessionRegistry::new();
        let _tap = registry.register("CA1", "t1");
        registry.remove("CA1");

        assert_eq!(registry.active_count(), 0);
        assert!(matches!(
            registry.attach("CA1", "t1"),
            Err(AttachError::SessionNotFound)
        ));
    }

    #[test]
    fn test_observer_message_serialization() {
        let json = serde_json::to_string(&ObserverMessage::Audio {
            payload: "YWJj".to_string(),
        })
        .expect("serialize");
        assert_eq!(json, r#"{"event":"audio","payload":"YWJj"}"#);

        let json = serde_json::to_string(&ObserverMessage::Transcription {
            role: "user",
            text: "hello".to_string(),
        })
        .expect("serialize");
        assert!(json.contains(r#""event":"transcription""#));
        assert!(json.contains(r#""role":"user""#));
    }
}
