//! Twilio REST API client.
//!
//! # API Reference
//!
//! - Create call: `POST /2010-04-01/Accounts/{sid}/Calls.json`
//! - Update call: `POST /2010-04-01/Accounts/{sid}/Calls/{call}.json`
//! - Fetch call:  `GET  /2010-04-01/Accounts/{sid}/Calls/{call}.json`
//! - Auth: HTTP basic, account SID + API key
//!
//! Credentials are per-tenant and passed into every request; the client owns
//! only the HTTP connection pool and the (overridable) base URL.

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::tenants::TenantCredentials;

/// Twilio API version path segment.
const API_VERSION: &str = "2010-04-01";

/// Telephony provider failures.
#[derive(Debug, Error)]
pub enum TelephonyError {
    #[error("Call not found: {call_sid}")]
    CallNotFound { call_sid: String },

    #[error("Telephony provider error: {message}")]
    Api { status: u16, message: String },

    #[error("Telephony transport error: {0}")]
    Transport(String),
}

pub type TelephonyResult<T> = Result<T, TelephonyError>;

/// Call metadata as reported by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct CallInfo {
    pub sid: String,
    /// Provider lifecycle status: queued, ringing, in-progress, completed...
    pub status: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// Call duration in seconds, as a string per the provider's schema.
    pub duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateCallResponse {
    sid: String,
}

/// Error body shape returned by the provider on failures.
#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    message: Option<String>,
}

/// Thin client over the Twilio calls API.
pub struct TwilioClient {
    http: reqwest::Client,
    base_url: String,
}

impl TwilioClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn calls_url(&self, account_sid: &str) -> String {
        format!("{}/{API_VERSION}/Accounts/{account_sid}/Calls.json", self.base_url)
    }

    fn call_url(&self, account_sid: &str, call_sid: &str) -> String {
        format!(
            "{}/{API_VERSION}/Accounts/{account_sid}/Calls/{call_sid}.json",
            self.base_url
        )
    }

    /// Create an outbound call from the tenant's provisioned number.
    ///
    /// `callback_url` is fetched by the carrier once the callee answers; it
    /// must carry the relay parameters for the media stream leg.
    pub async fn place_call(
        &self,
        creds: &TenantCredentials,
        to: &str,
        callback_url: &str,
    ) -> TelephonyResult<String> {
        let response = self
            .http
            .post(self.calls_url(&creds.twilio_account_sid))
            .basic_auth(&creds.twilio_account_sid, Some(&creds.twilio_api_key))
            .form(&[
                ("From", creds.twilio_phone_number.as_str()),
                ("To", to),
                ("Url", callback_url),
            ])
            .send()
            .await
            .map_err(|e| TelephonyError::Transport(e.to_string()))?;

        let response = check_status(response, None).await?;
        let call: CreateCallResponse = response
            .json()
            .await
            .map_err(|e| TelephonyError::Transport(format!("Invalid create-call response: {e}")))?;

        info!(call_sid = %call.sid, to = %to, "Outbound call created");
        Ok(call.sid)
    }

    /// End an in-flight call by moving it to `completed`.
    pub async fn end_call(&self, creds: &TenantCredentials, call_sid: &str) -> TelephonyResult<()> {
        let response = self
            .http
            .post(self.call_url(&creds.twilio_account_sid, call_sid))
            .basic_auth(&creds.twilio_account_sid, Some(&creds.twilio_api_key))
            .form(&[("Status", "completed")])
            .send()
            .await
            .map_err(|e| TelephonyError::Transport(e.to_string()))?;

        check_status(response, Some(call_sid)).await?;
        info!(call_sid = %call_sid, "Call ended");
        Ok(())
    }

    /// Fetch current call metadata.
    pub async fn fetch_call(
        &self,
        creds: &TenantCredentials,
        call_sid: &str,
    ) -> TelephonyResult<CallInfo> {
        let response = self
            .http
            .get(self.call_url(&creds.twilio_account_sid, call_sid))
            .basic_auth(&creds.twilio_account_sid, Some(&creds.twilio_api_key))
            .send()
            .await
            .map_err(|e| TelephonyError::Transport(e.to_string()))?;

        let response = check_status(response, Some(call_sid)).await?;
        response
            .json()
            .await
            .map_err(|e| TelephonyError::Transport(format!("Invalid call response: {e}")))
    }
}

/// Map non-success responses into the error taxonomy, surfacing the
/// provider's message where one is present.
async fn check_status(
    response: reqwest::Response,
    call_sid: Option<&str>,
) -> TelephonyResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == reqwest::StatusCode::NOT_FOUND
        && let Some(call_sid) = call_sid
    {
        return Err(TelephonyError::CallNotFound {
            call_sid: call_sid.to_string(),
        });
    }

    let message = response
        .json::<TwilioErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message)
        .unwrap_or_else(|| format!("request failed with status {status}"));

    Err(TelephonyError::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> TwilioClient {
        TwilioClient::new(reqwest::Client::new(), "https://api.twilio.example")
    }

    #[test]
    fn test_calls_url() {
        assert_eq!(
            client().calls_url("AC123"),
            "https://api.twilio.example/2010-04-01/Accounts/AC123/Calls.json"
        );
    }

    #[test]
    fn test_call_url() {
        assert_eq!(
            client().call_url("AC123", "CA456"),
            "https://api.twilio.example/2010-04-01/Accounts/AC123/Calls/CA456.json"
        );
    }

    #[test]
    fn test_call_info_deserialization() {
        let json = r#"{
            "sid": "CA456",
            "status": "in-progress",
            "start_time": "Mon, 05 Aug 2026 10:00:00 +0000",
            "end_time": null,
            "duration": null
        }"#;

        let info: CallInfo = serde_json::from_str(json).expect("should deserialize");
        assert_eq!(info.sid, "CA456");
        assert_eq!(info.status, "in-progress");
        assert!(info.end_time.is_none());
    }
}
