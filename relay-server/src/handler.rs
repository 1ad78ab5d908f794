//! The relay handler.
//!
//! One call per storage notification: filter → fetch → authenticate →
//! derive path → upload → log. Failures are logged and swallowed; the
//! handler never retries and never returns an error to its caller.

use crate::config::Config;
use relay_client::{
    DestinationConnector, DestinationStorage, FileOptions, SecretStore, SourceStorage,
    UploadResponse,
};
use relay_types::{
    destination_path, is_in_scope, relative_name, RelayError, StorageObjectData, UPLOAD_PREFIX,
};
use std::sync::Arc;

/// Values the handler needs from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySettings {
    /// Project owning the service-role secret
    pub project_id: String,
    /// Secret name
    pub secret_name: String,
    /// Supabase project URL
    pub destination_url: String,
    /// Supabase Storage bucket
    pub destination_bucket: String,
}

impl From<&Config> for RelaySettings {
    fn from(config: &Config) -> Self {
        Self {
            project_id: config.gcp.project_id.clone(),
            secret_name: config.gcp.secret_name.clone(),
            destination_url: config.destination.url.clone(),
            destination_bucket: config.destination.bucket.clone(),
        }
    }
}

/// A completed sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Source object name
    pub source: String,
    /// Destination object path
    pub destination: String,
    /// Bytes copied
    pub bytes: usize,
    /// Destination acknowledgement
    pub response: UploadResponse,
}

/// Result of one invocation. Informational only: every variant means the
/// event has been dealt with.
#[derive(Debug)]
pub enum Outcome {
    /// Object outside the upload prefix.
    Skipped {
        /// Object name
        name: String,
    },
    /// Object copied.
    Synced(SyncReport),
    /// Object not copied; the failure has been logged.
    Failed {
        /// Object name
        name: String,
        /// What went wrong
        error: RelayError,
    },
}

impl Outcome {
    /// Lowercase label used in acknowledgements.
    pub fn status(&self) -> &'static str {
        match self {
            Outcome::Skipped { .. } => "skipped",
            Outcome::Synced(_) => "synced",
            Outcome::Failed { .. } => "failed",
        }
    }
}

/// Copies in-scope objects from source storage to the destination.
pub struct RelayHandler {
    settings: RelaySettings,
    source: Arc<dyn SourceStorage>,
    secrets: Arc<dyn SecretStore>,
    connector: Arc<dyn DestinationConnector>,
}

impl std::fmt::Debug for RelayHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayHandler")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl RelayHandler {
    /// Create a handler over the given backends.
    pub fn new(
        settings: RelaySettings,
        source: Arc<dyn SourceStorage>,
        secrets: Arc<dyn SecretStore>,
        connector: Arc<dyn DestinationConnector>,
    ) -> Self {
        Self {
            settings,
            source,
            secrets,
            connector,
        }
    }

    /// Handler settings.
    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    /// Process one notification.
    pub async fn handle(&self, event: &StorageObjectData) -> Outcome {
        if !is_in_scope(&event.name) {
            tracing::info!("Skipping file outside {}: {}", UPLOAD_PREFIX, event.name);
            return Outcome::Skipped {
                name: event.name.clone(),
            };
        }

        tracing::info!(size = event.size.as_deref(), "Processing file: {}", event.name);

        match self.relay(event).await {
            Ok(report) => {
                tracing::info!(
                    bytes = report.bytes,
                    "Successfully synced {} to Supabase as {}",
                    report.source,
                    report.destination
                );
                tracing::info!("Response: {}", report.response);
                Outcome::Synced(report)
            }
            Err(error) => {
                tracing::error!(
                    stage = error.stage(),
                    bucket = %event.bucket,
                    "Error syncing {}: {}",
                    event.name,
                    error
                );
                tracing::error!("Error details: {:?}", error);
                Outcome::Failed {
                    name: event.name.clone(),
                    error,
                }
            }
        }
    }

    async fn relay(&self, event: &StorageObjectData) -> Result<SyncReport, RelayError> {
        let body = self
            .source
            .fetch_object(&event.bucket, &event.name)
            .await
            .map_err(|source| RelayError::Fetch {
                bucket: event.bucket.clone(),
                name: event.name.clone(),
                source,
            })?;
        tracing::info!("Downloaded {} bytes from GCS", body.len());

        let destination = self.connect().await?;

        // Strip and re-add the prefix. Destination always equals source.
        let relative = relative_name(&event.name).unwrap_or(event.name.as_str());
        tracing::debug!("Relative name: {}", relative);
        let path = destination_path(relative);

        let options = FileOptions::upsert(event.content_type_or_default());
        let bytes = body.len();
        let container = &self.settings.destination_bucket;

        let response = destination
            .upload(container, &path, body, &options)
            .await
            .map_err(|source| RelayError::Push {
                container: container.clone(),
                path: path.clone(),
                source,
            })?;

        Ok(SyncReport {
            source: event.name.clone(),
            destination: path,
            bytes,
            response,
        })
    }

    /// Fetch the key and build a destination client. Both happen on every
    /// invocation; nothing is cached.
    async fn connect(&self) -> Result<Box<dyn DestinationStorage>, RelayError> {
        let key = self
            .secrets
            .access_latest(&self.settings.project_id, &self.settings.secret_name)
            .await
            .map_err(|source| RelayError::Auth { source })?;

        self.connector
            .connect(&self.settings.destination_url, &key)
            .map_err(|source| RelayError::Auth { source })
    }
}
