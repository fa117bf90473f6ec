//! Access token issuance.

use std::sync::Arc;

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};

use crate::auth::CallerSource;
use crate::errors::app_error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateTokenRequest {
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateTokenResponse {
    pub token: String,
}

/// `POST /generate-token` - issue a one-hour access token for a known
/// caller source. Public: this is the issuance bootstrap.
pub async fn generate_token(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateTokenRequest>,
) -> AppResult<Json<GenerateTokenResponse>> {
    let source = CallerSource::parse(&request.source).ok_or_else(|| {
        AppError::Validation("Invalid source: must be 'frontend' or 'backend'".to_string())
    })?;

    let token = state
        .tokens
        .issue(source)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(GenerateTokenResponse { token }))
}
