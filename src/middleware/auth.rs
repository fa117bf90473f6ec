use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::Auth;
use crate::errors::auth_error::AuthError;
use crate::state::AppState;

/// Extract the access token from a request
///
/// Supports two token sources for browser/WebSocket compatibility:
/// 1. Authorization header: `Authorization: Bearer <token>` (preferred)
/// 2. Query parameter: `?token=<token>` (for WebSocket connections, where
///    browsers cannot set headers)
fn extract_token(request: &Request) -> Result<String, AuthError> {
    if let Some(auth_header) = request.headers().get("authorization") {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;

        if let Some(token) = auth_str.strip_prefix("Bearer ") {
            tracing::debug!("Token extracted from Authorization header");
            return Ok(token.to_string());
        }
        return Err(AuthError::InvalidAuthHeader);
    }

    if let Some(query) = request.uri().query() {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if key == "token" {
                tracing::debug!("Token extracted from query parameter");
                return Ok(value.to_string());
            }
        }
    }

    Err(AuthError::MissingToken)
}

/// Authentication middleware validating bearer tokens.
///
/// Verifies the token with the local token service and inserts an [`Auth`]
/// context into request extensions; handlers read the caller source from
/// there. Applied to both the control-plane routes and the streaming
/// upgrades (where it runs before the upgrade completes, so a bad token
/// refuses the socket with 401 rather than closing it later).
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let path = request.uri().path().to_string();

    let token = extract_token(&request)?;
    let claims = state.tokens.verify(&token)?;

    tracing::debug!(path = %path, source = %claims.source, "Token validated");
    request.extensions_mut().insert(Auth {
        source: claims.source,
    });

    Ok(next.run(request).await)
}

/// Origin allow-list gate for the streaming endpoints.
///
/// Browsers always send `Origin` on WebSocket upgrades; requests carrying
/// one are checked against the configured allow-list. Requests without an
/// `Origin` header (the carrier, server-side clients) pass - they are still
/// subject to token auth. With no allow-list configured the gate is off.
pub async fn origin_guard_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if let Some(allow_list) = state.config.origin_allow_list()
        && let Some(origin) = request.headers().get("origin")
    {
        let origin = origin
            .to_str()
            .map_err(|_| AuthError::OriginNotAllowed("invalid origin header".to_string()))?
            .trim_end_matches('/');

        if !allow_list.iter().any(|allowed| allowed == origin) {
            tracing::warn!(origin = %origin, "Rejected streaming connection from disallowed origin");
            return Err(AuthError::OriginNotAllowed(origin.to_string()));
        }
    }

    Ok(next.run(request).await)
}
