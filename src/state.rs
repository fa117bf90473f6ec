//! Shared application state.
//!
//! Every service the handlers need is constructed once here and reached
//! through `Arc<AppState>`; nothing in the gateway relies on process-global
//! handles.

use std::sync::Arc;

use anyhow::Context;

use crate::auth::TokenService;
use crate::config::ServerConfig;
use crate::relay::SessionRegistry;
use crate::telephony::TwilioClient;
use crate::tenants::{FirestoreDirectory, TenantDirectory};

pub struct AppState {
    pub config: ServerConfig,
    pub tokens: TokenService,
    pub tenants: Arc<dyn TenantDirectory>,
    pub telephony: TwilioClient,
    /// Shared HTTP connection pool for non-telephony upstreams.
    pub http: reqwest::Client,
    pub sessions: SessionRegistry,
}

impl AppState {
    /// Build the full application state, wiring the tenant directory from
    /// the configured credentials.
    pub fn new(config: ServerConfig) -> anyhow::Result<Arc<Self>> {
        let http = reqwest::Client::new();

        let tenants: Arc<dyn TenantDirectory> = if let Some(token) = &config.firestore_access_token {
            Arc::new(FirestoreDirectory::with_access_token(
                http.clone(),
                config.firestore_api_base.clone(),
                config.firebase_project_id.clone(),
                token.clone(),
            ))
        } else {
            let key_path = config
                .google_application_credentials
                .as_ref()
                .context("No Firestore credentials configured")?;
            Arc::new(
                FirestoreDirectory::with_service_account(
                    http.clone(),
                    config.firestore_api_base.clone(),
                    config.firebase_project_id.clone(),
                    key_path,
                    config.google_oauth_token_url.clone(),
                )
                .context("Failed to build Firestore directory")?,
            )
        };

        Self::assemble(config, tenants, http)
    }

    /// Build state around an externally supplied tenant directory.
    pub fn with_directory(
        config: ServerConfig,
        tenants: Arc<dyn TenantDirectory>,
    ) -> anyhow::Result<Arc<Self>> {
        Self::assemble(config, tenants, reqwest::Client::new())
    }

    fn assemble(
        config: ServerConfig,
        tenants: Arc<dyn TenantDirectory>,
        http: reqwest::Client,
    ) -> anyhow::Result<Arc<Self>> {
        let tokens = TokenService::new(&config.jwt_secret).context("Failed to build token service")?;
        let telephony = TwilioClient::new(http.clone(), config.twilio_api_base.clone());

        Ok(Arc::new(Self {
            config,
            tokens,
            tenants,
            telephony,
            http,
            sessions: SessionRegistry::new(),
        }))
    }
}
