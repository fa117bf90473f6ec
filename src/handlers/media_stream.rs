//! Carrier-facing media stream endpoint.

use std::sync::Arc;

use axum::{
    Extension,
    extract::{State, WebSocketUpgrade},
    response::Response,
};
use tracing::info;

use crate::auth::Auth;
use crate::relay::session;
use crate::state::AppState;

/// Maximum WebSocket message size (1 MB; media frames are small).
const MAX_WS_MESSAGE_SIZE: usize = 1024 * 1024;

/// `GET /outbound-media-stream` - upgrade the carrier connection and hand
/// the socket to a relay session task.
pub async fn media_stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<Auth>,
) -> Response {
    info!(source = %auth.source, "Carrier media stream upgrade requested");

    ws.max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| session::run(socket, state))
}
