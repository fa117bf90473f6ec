//! Error types for the gateway
//!
//! Split into two taxonomies: `AuthError` for authentication/authorization
//! failures (401/403, or a refused socket upgrade) and `AppError` for
//! control-plane request failures (400/500 with a structured JSON body).

pub mod app_error;
pub mod auth_error;
