pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod relay;
pub mod routes;
pub mod state;
pub mod telephony;
pub mod tenants;
pub mod voiceai;

// Re-export commonly used items for convenience
pub use auth::{Auth, CallerSource, TokenService};
pub use config::ServerConfig;
pub use errors::app_error::{AppError, AppResult};
pub use errors::auth_error::{AuthError, AuthResult};
pub use state::AppState;
