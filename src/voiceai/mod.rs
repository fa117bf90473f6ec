//! Conversational voice-AI backend integration (ElevenLabs Conversational AI).
//!
//! `messages` models the agent socket protocol; `client` fetches the
//! per-conversation signed URL and drives the outbound WebSocket.

mod client;
pub mod messages;

pub use client::{AgentConnection, get_signed_url};

use thiserror::Error;

/// Voice-AI backend failures.
#[derive(Debug, Error)]
pub enum VoiceAiError {
    #[error("Failed to get signed URL: {0}")]
    SignedUrl(String),

    #[error("Voice AI connection failed: {0}")]
    Connection(String),

    #[error("Voice AI connection closed")]
    Closed,
}

pub type VoiceAiResult<T> = Result<T, VoiceAiError>;
