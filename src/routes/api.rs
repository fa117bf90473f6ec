//! Control-plane route configuration.

use std::sync::Arc;

use axum::{
    Router,
    routing::{any, get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, calls, tokens};
use crate::state::AppState;

/// Routes that require a bearer token.
///
/// Note: the auth middleware is applied in main.rs after state is available.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/outbound-call", post(calls::outbound_call))
        .route("/end-call", post(calls::end_call))
        .route("/call-status", get(calls::call_status))
        .layer(TraceLayer::new_for_http())
}

/// Public routes: health check, token issuance, and the carrier's markup
/// callback (the carrier holds no token).
pub fn create_public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(api::health_check))
        .route("/generate-token", post(tokens::generate_token))
        .route("/outbound-call-twiml", any(calls::outbound_call_twiml))
        .layer(TraceLayer::new_for_http())
}
