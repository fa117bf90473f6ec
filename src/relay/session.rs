//! Media relay session state machine.
//!
//! One task per call owns both legs: the carrier's media-stream socket and
//! the voice-AI conversation socket. The task reacts to messages from either
//! side and never shares state with other sessions; peers talk to it purely
//! through channels.
//!
//! Lifecycle: `Initiating` on accept, `AwaitingStart` once the carrier's
//! `connected` handshake arrives, `Active` after `start` (which triggers
//! credential resolution and the voice-AI handshake), then `Closing` and
//! `Closed` when either leg goes away. Media received before `start` is
//! dropped, not buffered. A failed voice-AI handshake ends the carrier call
//! instead of leaving it running in silence.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::relay::ObserverMessage;
use crate::state::AppState;
use crate::telephony::stream::{CarrierEvent, CarrierMessage, MediaFrame, StreamStart};
use crate::voiceai::messages::{AgentCommand, AgentEvent, ConversationInitiation};
use crate::voiceai::{AgentConnection, get_signed_url};

/// Outgoing-channel capacity toward the carrier.
const CARRIER_CHANNEL_CAPACITY: usize = 1024;

/// Conversation overrides used when the call-control markup carried no
/// prompt or first message.
const DEFAULT_PROMPT: &str = "you are a gary from the phone store";
const DEFAULT_FIRST_MESSAGE: &str = "hey there! how can I help you today?";

/// Session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Carrier socket accepted; no identifiers known yet.
    Initiating,
    /// Carrier handshake done; waiting for the `start` event.
    AwaitingStart,
    /// Both legs up; forwarding.
    Active,
    /// One leg gone; tearing the other down.
    Closing,
    /// Session released.
    Closed,
}

/// Routing for the carrier-side writer task.
enum CarrierRoute {
    Message(CarrierMessage),
    Close,
}

/// What the select loop should do after handling an event.
enum LoopAction {
    Continue,
    /// The voice-AI leg came up; start selecting on its events.
    AttachAgent(mpsc::Receiver<AgentEvent>),
    /// A leg closed; stop the loop and tear down.
    Stop,
}

/// Entry point for a carrier connection to `/outbound-media-stream`.
pub async fn run(socket: WebSocket, app: Arc<AppState>) {
    info!("Carrier connected to outbound media stream");

    let (mut sender, mut receiver) = socket.split();
    let (carrier_tx, mut carrier_rx) = mpsc::channel::<CarrierRoute>(CARRIER_CHANNEL_CAPACITY);

    // Writer task for the carrier leg.
    let writer_task = tokio::spawn(async move {
        while let Some(route) = carrier_rx.recv().await {
            let result = match route {
                CarrierRoute::Message(message) => match serde_json::to_string(&message) {
                    Ok(json) => sender.send(Message::Text(json.into())).await,
                    Err(e) => {
                        error!("Failed to serialize carrier message: {e}");
                        continue;
                    }
                },
                CarrierRoute::Close => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            };

            if result.is_err() {
                break;
            }
        }
    });

    let mut session = RelaySession::new(app, carrier_tx);
    let mut agent_events: Option<mpsc::Receiver<AgentEvent>> = None;

    loop {
        let action = tokio::select! {
            incoming = receiver.next() => session.on_carrier_socket(incoming).await,
            event = next_agent_event(&mut agent_events) => match event {
                Some(event) => session.on_agent_event(event).await,
                None => {
                    info!(call_sid = session.call_sid.as_deref().unwrap_or("-"),
                        "Voice AI leg closed");
                    LoopAction::Stop
                }
            },
        };

        match action {
            LoopAction::Continue => {}
            LoopAction::AttachAgent(events) => agent_events = Some(events),
            LoopAction::Stop => break,
        }
    }

    session.shutdown().await;

    // Let the writer drain the close frame before the socket halves drop.
    drop(session);
    let _ = writer_task.await;
}

/// Pending forever while no voice-AI leg exists keeps the select loop on the
/// carrier branch alone.
async fn next_agent_event(events: &mut Option<mpsc::Receiver<AgentEvent>>) -> Option<AgentEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

struct RelaySession {
    app: Arc<AppState>,
    state: SessionState,
    carrier_tx: mpsc::Sender<CarrierRoute>,
    stream_sid: Option<String>,
    call_sid: Option<String>,
    tenant_id: Option<String>,
    agent: Option<AgentConnection>,
    tap: Option<broadcast::Sender<ObserverMessage>>,
    early_media_dropped: u64,
}

impl RelaySession {
    fn new(app: Arc<AppState>, carrier_tx: mpsc::Sender<CarrierRoute>) -> Self {
        Self {
            app,
            state: SessionState::Initiating,
            carrier_tx,
            stream_sid: None,
            call_sid: None,
            tenant_id: None,
            agent: None,
            tap: None,
            early_media_dropped: 0,
        }
    }

    fn transition(&mut self, to: SessionState) {
        debug!(from = ?self.state, to = ?to, "Session state transition");
        self.state = to;
    }

    /// Handle one poll result from the carrier socket.
    async fn on_carrier_socket(
        &mut self,
        incoming: Option<Result<Message, axum::Error>>,
    ) -> LoopAction {
        match incoming {
            Some(Ok(Message::Text(text))) => self.on_carrier_text(&text).await,
            Some(Ok(Message::Close(_))) | None => {
                info!("Carrier disconnected");
                LoopAction::Stop
            }
            Some(Ok(_)) => LoopAction::Continue,
            Some(Err(e)) => {
                warn!("Carrier socket error: {e}");
                LoopAction::Stop
            }
        }
    }

    async fn on_carrier_text(&mut self, text: &str) -> LoopAction {
        let event: CarrierEvent = match serde_json::from_str(text) {
            Ok(event) => event,
            Err(e) => {
                warn!("Failed to parse carrier event: {e}");
                return LoopAction::Continue;
            }
        };

        match event {
            CarrierEvent::Connected => {
                if self.state == SessionState::Initiating {
                    self.transition(SessionState::AwaitingStart);
                }
                LoopAction::Continue
            }
            CarrierEvent::Start { start } => self.on_start(start).await,
            CarrierEvent::Media { media } => {
                self.on_media(media).await;
                LoopAction::Continue
            }
            CarrierEvent::Stop => {
                info!(
                    stream_sid = self.stream_sid.as_deref().unwrap_or("-"),
                    "Carrier stream ended"
                );
                LoopAction::Stop
            }
            CarrierEvent::Other => {
                debug!("Ignoring unhandled carrier event");
                LoopAction::Continue
            }
        }
    }

    /// `AwaitingStart -> Active`: resolve credentials and bring up the
    /// voice-AI leg before any further carrier event is processed. Any
    /// failure here is fatal to the call, not a silent degradation.
    async fn on_start(&mut self, start: StreamStart) -> LoopAction {
        if matches!(self.state, SessionState::Active) {
            warn!("Duplicate start event ignored");
            return LoopAction::Continue;
        }

        let tenant_id = start.parameter("user_id").to_string();
        info!(
            stream_sid = %start.stream_sid,
            call_sid = %start.call_sid,
            tenant_id = %tenant_id,
            dropped_early_media = self.early_media_dropped,
            "Carrier stream started"
        );

        self.stream_sid = Some(start.stream_sid.clone());
        self.call_sid = Some(start.call_sid.clone());
        self.tenant_id = Some(tenant_id.clone());

        let credentials = match self.app.tenants.resolve(&tenant_id).await {
            Ok(credentials) => credentials,
            Err(e) => {
                error!(tenant_id = %tenant_id, error = %e,
                    "Credential resolution failed; abandoning session");
                // Without telephony credentials the call cannot be ended
                // provider-side; closing the socket is all that is left.
                self.transition(SessionState::Closing);
                return LoopAction::Stop;
            }
        };

        let handshake = async {
            let signed_url = get_signed_url(
                &self.app.http,
                &self.app.config.elevenlabs_api_base,
                &credentials.elevenlabs_agent_id,
                &credentials.elevenlabs_api_key,
            )
            .await?;
            AgentConnection::connect(&signed_url).await
        };

        let (agent, events) = match handshake.await {
            Ok(connection) => connection,
            Err(e) => {
                error!(call_sid = %start.call_sid, error = %e,
                    "Voice AI handshake failed; ending carrier call");
                if let Err(end_err) = self.app.telephony.end_call(&credentials, &start.call_sid).await
                {
                    error!(call_sid = %start.call_sid, error = %end_err,
                        "Failed to end call after handshake failure");
                }
                self.transition(SessionState::Closing);
                return LoopAction::Stop;
            }
        };

        let prompt = non_empty_or(start.parameter("prompt"), DEFAULT_PROMPT);
        let first_message = non_empty_or(start.parameter("first_message"), DEFAULT_FIRST_MESSAGE);
        debug!(prompt = %prompt, "Sending conversation initiation");

        let initiation = ConversationInitiation::new(&tenant_id, prompt, first_message);
        if let Err(e) = agent.send(AgentCommand::Initiation(initiation)).await {
            error!(call_sid = %start.call_sid, error = %e,
                "Voice AI leg closed before initiation; ending carrier call");
            if let Err(end_err) = self.app.telephony.end_call(&credentials, &start.call_sid).await {
                error!(call_sid = %start.call_sid, error = %end_err,
                    "Failed to end call after handshake failure");
            }
            self.transition(SessionState::Closing);
            return LoopAction::Stop;
        }

        self.agent = Some(agent);
        self.tap = Some(self.app.sessions.register(&start.call_sid, &tenant_id));
        self.transition(SessionState::Active);

        LoopAction::AttachAgent(events)
    }

    /// Caller audio toward the voice-AI leg. A no-op outside `Active`; in
    /// `Active` with the voice-AI socket gone the frame is dropped with a
    /// log line rather than buffered.
    async fn on_media(&mut self, media: MediaFrame) {
        if self.state != SessionState::Active {
            self.early_media_dropped += 1;
            debug!(
                dropped = self.early_media_dropped,
                "Dropping media received before start"
            );
            return;
        }

        match &self.agent {
            Some(agent) if agent.is_open() => {
                if agent
                    .send(AgentCommand::AudioChunk(media.payload))
                    .await
                    .is_err()
                {
                    warn!("Voice AI socket closed mid-send, dropping audio frame");
                }
            }
            _ => {
                warn!("Voice AI socket not open, dropping audio frame");
            }
        }
    }

    /// Dispatch one voice-AI event.
    async fn on_agent_event(&mut self, event: AgentEvent) -> LoopAction {
        match event {
            AgentEvent::ConversationInitiationMetadata {
                conversation_initiation_metadata_event,
            } => {
                debug!("Received conversation initiation metadata");
                self.publish(ObserverMessage::Metadata {
                    payload: conversation_initiation_metadata_event,
                });
            }

            AgentEvent::Audio { payload } => {
                let Some(stream_sid) = self.stream_sid.clone() else {
                    debug!("Agent audio before stream id is known, dropping");
                    return LoopAction::Continue;
                };

                let audio = payload.into_base64();
                self.publish(ObserverMessage::Audio {
                    payload: audio.clone(),
                });
                self.send_carrier(CarrierMessage::media(&stream_sid, audio)).await;
            }

            AgentEvent::Interruption => {
                debug!("Barge-in: clearing carrier audio buffer");
                if let Some(stream_sid) = self.stream_sid.clone() {
                    self.send_carrier(CarrierMessage::clear(&stream_sid)).await;
                }
            }

            AgentEvent::Ping { ping_event } => {
                if let Some(agent) = &self.agent
                    && agent
                        .send(AgentCommand::Pong {
                            event_id: ping_event.event_id,
                        })
                        .await
                        .is_err()
                {
                    warn!("Failed to answer voice AI ping");
                }
            }

            AgentEvent::AgentResponse {
                agent_response_event,
            } => {
                info!(response = %agent_response_event.agent_response, "Agent response");
                self.publish(ObserverMessage::Transcription {
                    role: "agent",
                    text: agent_response_event.agent_response,
                });
            }

            AgentEvent::UserTranscript {
                user_transcription_event,
            } => {
                info!(transcript = %user_transcription_event.user_transcript, "User transcript");
                self.publish(ObserverMessage::Transcription {
                    role: "user",
                    text: user_transcription_event.user_transcript,
                });
            }

            AgentEvent::Other => {
                debug!("Ignoring unhandled voice AI event");
            }
        }

        LoopAction::Continue
    }

    async fn send_carrier(&self, message: CarrierMessage) {
        if self.carrier_tx.send(CarrierRoute::Message(message)).await.is_err() {
            warn!("Carrier writer gone, dropping outbound message");
        }
    }

    /// Expose an event to an attached observer, if any.
    fn publish(&self, message: ObserverMessage) {
        if let Some(tap) = &self.tap {
            // No subscribers is the common case and not an error.
            let _ = tap.send(message);
        }
    }

    /// `Closing -> Closed`: close whichever leg is still up and release the
    /// session.
    async fn shutdown(&mut self) {
        if self.state != SessionState::Closing {
            self.transition(SessionState::Closing);
        }

        // Dropping the handle closes the voice-AI socket.
        self.agent = None;

        let _ = self.carrier_tx.send(CarrierRoute::Close).await;

        if let Some(call_sid) = &self.call_sid {
            self.app.sessions.remove(call_sid);
        }
        self.tap = None;

        self.transition(SessionState::Closed);
        info!(
            call_sid = self.call_sid.as_deref().unwrap_or("-"),
            "Relay session closed"
        );
    }
}

fn non_empty_or(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}
