//! Observer-facing bridge endpoint.
//!
//! Lets a non-telephony client (typically a browser) watch a live call.
//! The observer connects with the call and tenant identifiers, sends a
//! `connect-twilio` command, and from then on receives the call's observed
//! events as a normalized `{event, ...}` stream. Closing the observer
//! socket detaches it; the call session ending closes the observer stream.

use std::sync::Arc;

use axum::{
    Extension,
    extract::{
        Query, State, WebSocketUpgrade,
        ws::{CloseFrame, Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::auth::Auth;
use crate::state::AppState;

/// Policy-violation close code, sent when required parameters are missing.
const CLOSE_POLICY: u16 = 1008;

#[derive(Debug, Deserialize)]
pub struct ObserverParams {
    #[serde(rename = "callSid", default)]
    pub call_sid: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Commands the observer client may send.
#[derive(Debug, Deserialize)]
#[serde(tag = "event")]
enum ObserverCommand {
    /// Attach to the call's relay session.
    #[serde(rename = "connect-twilio")]
    Connect,

    #[serde(other)]
    Other,
}

/// `GET /frontend-stream?callSid=...&user_id=...` - observer socket upgrade.
pub async fn frontend_stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<Auth>,
    Query(params): Query<ObserverParams>,
) -> Response {
    info!(source = %auth.source, "Observer stream upgrade requested");
    ws.on_upgrade(move |socket| handle_observer_socket(socket, state, params))
}

async fn handle_observer_socket(socket: WebSocket, state: Arc<AppState>, params: ObserverParams) {
    let (mut sender, mut receiver) = socket.split();

    let (Some(call_sid), Some(user_id)) = (params.call_sid, params.user_id) else {
        warn!("Observer connected without callSid or user_id");
        let _ = sender
            .send(Message::Close(Some(CloseFrame {
                code: CLOSE_POLICY,
                reason: "Missing callSid or user_id".into(),
            })))
            .await;
        return;
    };

    info!(call_sid = %call_sid, tenant_id = %user_id, "Observer connected");

    // Wait for the connect command before attaching anything.
    let mut tap = loop {
        match receiver.next().await {
            Some(Ok(Message::Text(text))) => match serde_json::from_str::<ObserverCommand>(&text) {
                Ok(ObserverCommand::Connect) => {
                    match state.sessions.attach(&call_sid, &user_id) {
                        Ok(tap) => break tap,
                        Err(e) => {
                            warn!(call_sid = %call_sid, error = %e, "Observer attach refused");
                            let _ = sender
                                .send(Message::Close(Some(CloseFrame {
                                    code: CLOSE_POLICY,
                                    reason: e.to_string().into(),
                                })))
                                .await;
                            return;
                        }
                    }
                }
                Ok(ObserverCommand::Other) => debug!("Ignoring observer message"),
                Err(e) => warn!("Failed to parse observer message: {e}"),
            },
            Some(Ok(Message::Close(_))) | None => {
                info!("Observer disconnected before attaching");
                return;
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!("Observer socket error: {e}");
                return;
            }
        }
    };

    info!(call_sid = %call_sid, "Observer attached to call session");

    // Forward observed events until either side goes away.
    loop {
        tokio::select! {
            observed = tap.recv() => match observed {
                Ok(message) => {
                    let json = match serde_json::to_string(&message) {
                        Ok(json) => json,
                        Err(e) => {
                            warn!("Failed to serialize observer event: {e}");
                            continue;
                        }
                    };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Observer lagging, dropping events");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!(call_sid = %call_sid, "Call session ended, closing observer stream");
                    break;
                }
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => {
                    info!("Observer disconnected");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("Observer socket error: {e}");
                    break;
                }
            },
        }
    }

    let _ = sender.send(Message::Close(None)).await;
}
