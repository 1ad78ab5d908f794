//! Relay server wiring.
//!
//! `UploadRelay` owns the configuration and the handler; `serve` exposes
//! it over HTTP until the shutdown future resolves.

use crate::config::Config;
use crate::error::{Result, ServerError};
use crate::handler::{RelayHandler, RelaySettings};
use crate::http::build_router;
use relay_client::{GcsStorage, GoogleAuth, SecretManager, SupabaseConnector};
use std::future::Future;
use std::sync::Arc;

/// Main relay server.
#[derive(Debug)]
pub struct UploadRelay {
    config: Config,
    handler: RelayHandler,
}

impl UploadRelay {
    /// Create a relay from a config and a prepared handler.
    pub fn new(config: Config, handler: RelayHandler) -> Self {
        Self { config, handler }
    }

    /// Create a relay backed by GCS, Secret Manager and Supabase.
    pub fn from_config(config: Config) -> Result<Self> {
        let auth = GoogleAuth::from_settings(
            config.gcp.access_token.as_deref(),
            &config.gcp.metadata_endpoint,
        )?;
        let source = GcsStorage::new(config.gcp.storage_endpoint.clone(), auth.clone())?;
        let secrets = SecretManager::new(config.gcp.secret_manager_endpoint.clone(), auth)?;

        let handler = RelayHandler::new(
            RelaySettings::from(&config),
            Arc::new(source),
            Arc::new(secrets),
            Arc::new(SupabaseConnector::new()),
        );
        Ok(Self::new(config, handler))
    }

    /// Get the relay configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the relay handler.
    pub fn handler(&self) -> &RelayHandler {
        &self.handler
    }
}

/// Bind the configured address and serve until `shutdown` resolves.
pub async fn serve<F>(relay: Arc<UploadRelay>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let address = relay.config().server.bind_address.clone();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| ServerError::Bind {
            address: address.clone(),
            source: e,
        })?;

    tracing::info!("Listening for storage events on {}", listener.local_addr()?);

    axum::serve(listener, build_router(relay))
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
