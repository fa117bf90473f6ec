//! Agent socket protocol messages.
//!
//! The voice-AI backend speaks JSON over the conversation WebSocket. Events
//! are dispatched by `type`; audio arrives in one of two envelope shapes
//! (`audio.chunk` or `audio_event.audio_base_64`), modeled as a single
//! tagged payload variant. Ping events must be answered promptly with a pong
//! echoing the event id or the backend drops the connection.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Incoming events (backend -> gateway)
// =============================================================================

/// Events received from the voice-AI backend.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum AgentEvent {
    /// Conversation accepted; metadata is observable only.
    #[serde(rename = "conversation_initiation_metadata")]
    ConversationInitiationMetadata {
        #[serde(default)]
        conversation_initiation_metadata_event: Value,
    },

    /// One chunk of agent speech, in either payload shape.
    #[serde(rename = "audio")]
    Audio {
        #[serde(flatten)]
        payload: AudioPayload,
    },

    /// The human speaker started talking over the agent (barge-in).
    #[serde(rename = "interruption")]
    Interruption,

    /// Keep-alive; must be answered with a pong carrying the same event id.
    #[serde(rename = "ping")]
    Ping { ping_event: PingEvent },

    /// What the agent said, as text. Observable only.
    #[serde(rename = "agent_response")]
    AgentResponse { agent_response_event: AgentResponseEvent },

    /// What the caller said, as text. Observable only.
    #[serde(rename = "user_transcript")]
    UserTranscript { user_transcription_event: UserTranscriptEvent },

    /// Unhandled event types are logged and ignored.
    #[serde(other)]
    Other,
}

/// The two envelope shapes agent audio arrives in.
#[derive(Debug, Deserialize)]
pub enum AudioPayload {
    #[serde(rename = "audio")]
    Chunk { chunk: String },
    #[serde(rename = "audio_event")]
    Event { audio_base_64: String },
}

impl AudioPayload {
    /// The base64 audio regardless of envelope shape.
    pub fn into_base64(self) -> String {
        match self {
            AudioPayload::Chunk { chunk } => chunk,
            AudioPayload::Event { audio_base_64 } => audio_base_64,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PingEvent {
    /// Passed back verbatim in the pong; the backend has used both numeric
    /// and string ids, so no shape is assumed.
    pub event_id: Value,
}

#[derive(Debug, Deserialize)]
pub struct AgentResponseEvent {
    #[serde(default)]
    pub agent_response: String,
}

#[derive(Debug, Deserialize)]
pub struct UserTranscriptEvent {
    #[serde(default)]
    pub user_transcript: String,
}

// =============================================================================
// Outgoing messages (gateway -> backend)
// =============================================================================

/// Conversation overrides sent as the first message after connecting.
#[derive(Debug, Serialize)]
pub struct ConversationInitiation {
    #[serde(rename = "type")]
    kind: &'static str,
    dynamic_variables: DynamicVariables,
    conversation_config_override: ConversationConfigOverride,
}

#[derive(Debug, Serialize)]
struct DynamicVariables {
    user_name: String,
    user_id: String,
}

#[derive(Debug, Serialize)]
struct ConversationConfigOverride {
    agent: AgentOverride,
}

#[derive(Debug, Serialize)]
struct AgentOverride {
    prompt: PromptOverride,
    first_message: String,
}

#[derive(Debug, Serialize)]
struct PromptOverride {
    prompt: String,
}

impl ConversationInitiation {
    pub fn new(tenant_id: &str, prompt: String, first_message: String) -> Self {
        Self {
            kind: "conversation_initiation_client_data",
            dynamic_variables: DynamicVariables {
                user_name: tenant_id.to_string(),
                user_id: tenant_id.to_string(),
            },
            conversation_config_override: ConversationConfigOverride {
                agent: AgentOverride {
                    prompt: PromptOverride { prompt },
                    first_message,
                },
            },
        }
    }
}

/// Messages the relay writes to the agent socket.
#[derive(Debug)]
pub enum AgentCommand {
    /// Conversation configuration, sent once after the handshake.
    Initiation(ConversationInitiation),
    /// Keep-alive answer, echoing the ping's event id.
    Pong { event_id: Value },
    /// One frame of caller audio, base64 as received from the carrier.
    AudioChunk(String),
}

impl AgentCommand {
    /// Wire encoding. Audio chunks use the bare `{user_audio_chunk}` shape
    /// (no `type` tag) per the protocol.
    pub fn to_json(&self) -> serde_json::Result<String> {
        match self {
            AgentCommand::Initiation(init) => serde_json::to_string(init),
            AgentCommand::Pong { event_id } => serde_json::to_string(&serde_json::json!({
                "type": "pong",
                "event_id": event_id,
            })),
            AgentCommand::AudioChunk(payload) => serde_json::to_string(&serde_json::json!({
                "user_audio_chunk": payload,
            })),
        }
    }
}
