//! Carrier media-stream socket protocol.
//!
//! Message envelopes for the bidirectional stream the carrier opens against
//! `/outbound-media-stream`: `connected`/`start`/`media`/`stop` inbound, and
//! `media`/`clear` outbound. Audio payloads are opaque base64 blobs and are
//! never decoded here.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// Incoming events (carrier -> gateway)
// =============================================================================

/// Events received from the carrier on the media-stream socket.
#[derive(Debug, Deserialize)]
#[serde(tag = "event")]
pub enum CarrierEvent {
    /// Socket-level handshake, sent once before `start`.
    #[serde(rename = "connected")]
    Connected,

    /// Stream metadata: call/stream identifiers and the custom parameters
    /// carried over from the call-control markup.
    #[serde(rename = "start")]
    Start { start: StreamStart },

    /// One frame of caller audio.
    #[serde(rename = "media")]
    Media { media: MediaFrame },

    /// The carrier is tearing the stream down.
    #[serde(rename = "stop")]
    Stop,

    /// Anything else (`dtmf`, `mark`, future event types) is ignored.
    #[serde(other)]
    Other,
}

/// Payload of the carrier `start` event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStart {
    pub stream_sid: String,
    pub call_sid: String,
    #[serde(default)]
    pub custom_parameters: HashMap<String, String>,
}

impl StreamStart {
    /// Fetch a custom parameter, empty when the markup carried no value.
    pub fn parameter(&self, name: &str) -> &str {
        self.custom_parameters.get(name).map(String::as_str).unwrap_or("")
    }
}

/// Payload of a carrier `media` event.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaFrame {
    /// Base64-encoded audio, passed through untouched.
    pub payload: String,
}

// =============================================================================
// Outgoing events (gateway -> carrier)
// =============================================================================

/// Events the gateway sends to the carrier.
#[derive(Debug, Serialize)]
#[serde(tag = "event")]
pub enum CarrierMessage {
    /// Agent audio for the caller, keyed by the stream it belongs to.
    #[serde(rename = "media")]
    Media {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        media: OutboundMedia,
    },

    /// Flush the carrier's buffered outbound audio (barge-in).
    #[serde(rename = "clear")]
    Clear {
        #[serde(rename = "streamSid")]
        stream_sid: String,
    },
}

#[derive(Debug, Serialize)]
pub struct OutboundMedia {
    pub payload: String,
    pub track: &'static str,
}

impl CarrierMessage {
    pub fn media(stream_sid: &str, payload: String) -> Self {
        CarrierMessage::Media {
            stream_sid: stream_sid.to_string(),
            media: OutboundMedia {
                payload,
                track: "inbound_track",
            },
        }
    }

    pub fn clear(stream_sid: &str) -> Self {
        CarrierMessage::Clear {
            stream_sid: stream_sid.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_event_deserialization() {
        let json = r#"{
            "event": "start",
            "sequenceNumber": "1",
            "start": {
                "streamSid": "MZabc",
                "accountSid": "AC123",
                "callSid": "CA456",
                "tracks": ["inbound"],
                "customParameters": {
                    "user_id": "t1",
                    "prompt": "you are a scheduler",
                    "first_message": "hi there"
                }
            },
            "streamSid": "MZabc"
        }"#;

        let event: CarrierEvent = serde_json::from_str(json).expect("should deserialize");
        match event {
            CarrierEvent::Start { start } => {
                assert_eq!(start.stream_sid, "MZabc");
                assert_eq!(start.call_sid, "CA456");
                assert_eq!(start.parameter("prompt"), "you are a scheduler");
                assert_eq!(start.parameter("missing"), "");
            }
            other => panic!("Expected Start, got {other:?}"),
        }
    }

    #[test]
    fn test_media_event_deserialization() {
        let json = r#"{
            "event": "media",
            "media": { "track": "inbound", "chunk": "2", "timestamp": "40", "payload": "c2lsZW5jZQ==" },
            "streamSid": "MZabc"
        }"#;

        let event: CarrierEvent = serde_json::from_str(json).expect("should deserialize");
        match event {
            CarrierEvent::Media { media } => assert_eq!(media.payload, "c2lsZW5jZQ=="),
            other => panic!("Expected Media, got {other:?}"),
        }
    }

    #[test]
    fn test_stop_event_with_body() {
        let json = r#"{
            "event": "stop",
            "sequenceNumber": "3",
            "stop": {"accountSid": "AC123", "callSid": "CA456"},
            "streamSid": "MZabc"
        }"#;
        let event: CarrierEvent = serde_json::from_str(json).expect("should deserialize");
        assert!(matches!(event, CarrierEvent::Stop));
    }

    #[test]
    fn test_unknown_event_tolerated() {
        let json = r#"{"event": "mark", "mark": {"name": "checkpoint"}}"#;
        let event: CarrierEvent = serde_json::from_str(json).expect("should deserialize");
        assert!(matches!(event, CarrierEvent::Other));
    }

    #[test]
    fn test_outbound_media_serialization() {
        let message = CarrierMessage::media("MZabc", "cGF5bG9hZA==".to_string());
        let json = serde_json::to_string(&message).expect("should serialize");

        assert!(json.contains(r#""event":"media""#));
        assert!(json.contains(r#""streamSid":"MZabc""#));
        assert!(json.contains(r#""payload":"cGF5bG9hZA==""#));
        assert!(json.contains(r#""track":"inbound_track""#));
    }

    #[test]
    fn test_clear_serialization() {
        let json = serde_json::to_string(&CarrierMessage::clear("MZabc")).expect("should serialize");
        assert_eq!(json, r#"{"event":"clear","streamSid":"MZabc"}"#);
    }
}
