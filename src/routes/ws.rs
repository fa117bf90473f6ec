//! Streaming route configuration.
//!
//! # Endpoints
//!
//! `GET /outbound-media-stream` - carrier-facing relay socket. The carrier
//! sends `start`/`media`/`stop` events and receives `media`/`clear`.
//!
//! `GET /frontend-stream?callSid=...&user_id=...` - observer socket. The
//! client sends `{"event": "connect-twilio"}` to attach and receives the
//! call's observed events as a normalized `{event, ...}` stream.
//!
//! # Authentication
//!
//! Both endpoints take the access token as a `?token=` query parameter
//! (WebSocket clients cannot set headers) and are additionally gated by the
//! caller-origin allow-list; the middleware is layered in main.rs.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::{media_stream, observer};
use crate::state::AppState;

pub fn create_ws_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/outbound-media-stream", get(media_stream::media_stream_handler))
        .route("/frontend-stream", get(observer::frontend_stream_handler))
        .layer(TraceLayer::new_for_http())
}
