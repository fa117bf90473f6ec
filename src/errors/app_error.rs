use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::telephony::TelephonyError;
use crate::tenants::CredentialError;
use crate::voiceai::VoiceAiError;

/// Control-plane request failures.
///
/// Every variant renders as `{"success": false, "error": "..."}` so callers
/// see one response shape regardless of which layer failed. Validation maps
/// to 400; credential and upstream failures map to 500 with the provider
/// message surfaced where one is available.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Telephony(#[from] TelephonyError),

    #[error(transparent)]
    VoiceAi(#[from] VoiceAiError),

    #[error("{0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Credential(_)
            | AppError::Telephony(_)
            | AppError::VoiceAi(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
