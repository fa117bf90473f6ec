//! Outbound WebSocket client for the voice-AI backend.
//!
//! Conversations are authenticated out-of-band: a signed WebSocket URL is
//! fetched from the REST API with the tenant's API key, then dialed with no
//! further credentials. One task per connection owns both socket halves,
//! draining outbound commands from a channel and delivering parsed events
//! into another; the relay session never touches the socket directly.

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use super::messages::{AgentCommand, AgentEvent};
use super::{VoiceAiError, VoiceAiResult};

/// Channel capacity for both directions of a connection.
const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    signed_url: String,
}

/// Fetch a signed conversation URL for the given agent.
pub async fn get_signed_url(
    http: &reqwest::Client,
    base_url: &str,
    agent_id: &str,
    api_key: &str,
) -> VoiceAiResult<String> {
    let response = http
        .get(format!("{base_url}/v1/convai/conversation/get_signed_url"))
        .query(&[("agent_id", agent_id)])
        .header("xi-api-key", api_key)
        .send()
        .await
        .map_err(|e| VoiceAiError::SignedUrl(e.to_string()))?;

    if !response.status().is_success() {
        return Err(VoiceAiError::SignedUrl(format!(
            "request failed with status {}",
            response.status()
        )));
    }

    let body: SignedUrlResponse = response
        .json()
        .await
        .map_err(|e| VoiceAiError::SignedUrl(format!("invalid response: {e}")))?;

    Ok(body.signed_url)
}

/// Command side of a live connection to the voice-AI backend.
///
/// Dropping the handle closes the socket; the backend closing the socket
/// ends the event stream returned alongside it.
pub struct AgentConnection {
    commands: mpsc::Sender<AgentCommand>,
}

impl AgentConnection {
    /// Dial a signed conversation URL and start the connection task.
    ///
    /// Returns the command handle and the stream of parsed backend events.
    /// The event channel closing means the socket is gone.
    pub async fn connect(
        signed_url: &str,
    ) -> VoiceAiResult<(Self, mpsc::Receiver<AgentEvent>)> {
        let (ws_stream, _response) = tokio_tungstenite::connect_async(signed_url)
            .await
            .map_err(|e| VoiceAiError::Connection(e.to_string()))?;

        info!("Connected to voice AI backend");

        let (mut ws_sink, mut ws_source) = ws_stream.split();
        let (command_tx, mut command_rx) = mpsc::channel::<AgentCommand>(CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel::<AgentEvent>(CHANNEL_CAPACITY);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    command = command_rx.recv() => {
                        let Some(command) = command else {
                            // Session side gone; close the socket politely.
                            let _ = ws_sink.send(Message::Close(None)).await;
                            break;
                        };

                        let json = match command.to_json() {
                            Ok(json) => json,
                            Err(e) => {
                                warn!("Failed to serialize agent command: {e}");
                                continue;
                            }
                        };

                        if let Err(e) = ws_sink.send(Message::Text(json.into())).await {
                            warn!("Failed to send to voice AI backend: {e}");
                            break;
                        }
                    }

                    message = ws_source.next() => {
                        match message {
                            Some(Ok(Message::Text(text))) => {
                                match serde_json::from_str::<AgentEvent>(&text) {
                                    Ok(event) => {
                                        if event_tx.send(event).await.is_err() {
                                            break;
                                        }
                                    }
                                    Err(e) => {
                                        warn!("Failed to parse agent event: {e}");
                                    }
                                }
                            }
                            Some(Ok(Message::Ping(data))) => {
                                if ws_sink.send(Message::Pong(data)).await.is_err() {
                                    break;
                                }
                            }
                            Some(Ok(Message::Close(_))) => {
                                info!("Voice AI backend closed the connection");
                                break;
                            }
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                warn!("Voice AI socket error: {e}");
                                break;
                            }
                            None => break,
                        }
                    }
                }
            }

            debug!("Voice AI connection task finished");
        });

        Ok((Self { commands: command_tx }, event_rx))
    }

    /// Whether the socket is still up.
    pub fn is_open(&self) -> bool {
        !self.commands.is_closed()
    }

    /// Queue a message for the backend.
    pub async fn send(&self, command: AgentCommand) -> VoiceAiResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| VoiceAiError::Closed)
    }
}
