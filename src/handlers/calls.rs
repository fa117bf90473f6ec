//! Call control plane: initiation, call-control markup, termination, status.
//!
//! Every operation resolves the tenant's credentials fresh and aborts on any
//! resolution failure - a call is never placed with a partial credential set.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::CallerSource;
use crate::errors::app_error::{AppError, AppResult};
use crate::state::AppState;
use crate::telephony::twiml;

// =============================================================================
// Outbound call initiation
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct OutboundCallRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub first_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OutboundCallResponse {
    pub success: bool,
    pub message: &'static str,
    #[serde(rename = "callSid")]
    pub call_sid: String,
}

/// `POST /outbound-call` - resolve the tenant's credentials and ask the
/// carrier to create a call, pointing its callback at the markup endpoint
/// with the relay parameters encoded in the URL.
pub async fn outbound_call(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<OutboundCallRequest>,
) -> AppResult<Json<OutboundCallResponse>> {
    let user_id = require(request.user_id, "User ID and phone number are required")?;
    let number = require(request.number, "User ID and phone number are required")?;

    let credentials = state.tenants.resolve(&user_id).await?;

    let host = callback_host(&state, &headers)?;
    let callback_url = format!(
        "https://{}/outbound-call-twiml?user_id={}&prompt={}&first_message={}",
        host,
        percent_encode(&user_id),
        percent_encode(request.prompt.as_deref().unwrap_or("")),
        percent_encode(request.first_message.as_deref().unwrap_or("")),
    );

    let call_sid = state
        .telephony
        .place_call(&credentials, &number, &callback_url)
        .await?;

    info!(call_sid = %call_sid, tenant_id = %user_id, "Call initiated");
    Ok(Json(OutboundCallResponse {
        success: true,
        message: "Call initiated",
        call_sid,
    }))
}

// =============================================================================
// Call-control markup
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct TwimlQuery {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub first_message: String,
}

/// `ALL /outbound-call-twiml` - answer the carrier's callback with markup
/// directing it to open the media stream, passing the relay parameters
/// through. Public and infallible: missing parameters render empty and the
/// carrier proceeds regardless.
pub async fn outbound_call_twiml(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<TwimlQuery>,
) -> Response {
    let host = callback_host(&state, &headers).unwrap_or_default();

    // The carrier cannot present a bearer token of its own, so the stream
    // URL carries one for the socket upgrade.
    let stream_url = match state.tokens.issue(CallerSource::Backend) {
        Ok(token) => format!("wss://{host}/outbound-media-stream?token={token}"),
        Err(_) => format!("wss://{host}/outbound-media-stream"),
    };

    let body = twiml::connect_stream(&stream_url, &query.user_id, &query.prompt, &query.first_message);

    ([(header::CONTENT_TYPE, "text/xml")], body).into_response()
}

// =============================================================================
// Call termination and status
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct EndCallRequest {
    #[serde(rename = "callSid", default)]
    pub call_sid: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EndCallResponse {
    pub success: bool,
    pub message: &'static str,
}

/// `POST /end-call` - move the call to its terminated status provider-side.
pub async fn end_call(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EndCallRequest>,
) -> AppResult<Json<EndCallResponse>> {
    let call_sid = require(request.call_sid, "Call SID and User ID are required")?;
    let user_id = require(request.user_id, "Call SID and User ID are required")?;

    let credentials = state.tenants.resolve(&user_id).await?;
    state.telephony.end_call(&credentials, &call_sid).await?;

    Ok(Json(EndCallResponse {
        success: true,
        message: "Call ended successfully",
    }))
}

#[derive(Debug, Deserialize)]
pub struct CallStatusQuery {
    #[serde(rename = "callSid", default)]
    pub call_sid: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CallStatusResponse {
    pub success: bool,
    #[serde(rename = "callSid")]
    pub call_sid: String,
    pub status: String,
    #[serde(rename = "startTime")]
    pub start_time: Option<String>,
    #[serde(rename = "endTime")]
    pub end_time: Option<String>,
    pub duration: Option<String>,
}

/// `GET /call-status` - fetch call metadata from the provider.
pub async fn call_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallStatusQuery>,
) -> AppResult<Json<CallStatusResponse>> {
    let call_sid = require(query.call_sid, "Call SID and User ID are required")?;
    let user_id = require(query.user_id, "Call SID and User ID are required")?;

    let credentials = state.tenants.resolve(&user_id).await?;
    let call = state.telephony.fetch_call(&credentials, &call_sid).await?;

    Ok(Json(CallStatusResponse {
        success: true,
        call_sid: call.sid,
        status: call.status,
        start_time: call.start_time,
        end_time: call.end_time,
        duration: call.duration,
    }))
}

// =============================================================================
// Helpers
// =============================================================================

fn require(value: Option<String>, message: &str) -> AppResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Validation(message.to_string()))
}

/// Host used in carrier-facing URLs: the configured public host when the
/// gateway sits behind a proxy, else the request's own Host header.
fn callback_host(state: &AppState, headers: &HeaderMap) -> AppResult<String> {
    if let Some(host) = &state.config.public_host {
        return Ok(host.clone());
    }

    headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation("Unable to determine callback host".to_string()))
}

/// Percent-encode a callback query value (RFC 3986 unreserved set kept,
/// spaces as `%20`).
fn percent_encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char);
            }
            _ => {
                encoded.push('%');
                encoded.push_str(&format!("{byte:02X}"));
            }
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_encode_spaces_and_symbols() {
        assert_eq!(percent_encode("you are a scheduler"), "you%20are%20a%20scheduler");
        assert_eq!(percent_encode("+15555550123"), "%2B15555550123");
        assert_eq!(percent_encode("plain-value_1.0~x"), "plain-value_1.0~x");
    }

    #[test]
    fn test_require_rejects_missing_and_blank() {
        assert!(require(None, "required").is_err());
        assert!(require(Some("  ".to_string()), "required").is_err());
        assert_eq!(require(Some("t1".to_string()), "required").unwrap(), "t1");
    }
}
