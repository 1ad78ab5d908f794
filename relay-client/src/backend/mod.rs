//! Backend abstraction for the upload relay.
//!
//! The relay talks to three services per invocation:
//! - [`SourceStorage`] reads the uploaded object
//! - [`SecretStore`] yields the destination credential
//! - [`DestinationConnector`] turns base URL + credential into a
//!   [`DestinationStorage`] client that performs the upload
//!
//! The destination client is built per invocation because it carries a
//! freshly fetched key.
//!
//! # Example
//!
//! ```ignore
//! let bytes = source.fetch_object("b1", "uploads/a.csv").await?;
//! let key = secrets.access_latest("project", "supabase-service-role-key").await?;
//! let destination = connector.connect("https://xyz.supabase.co", &key)?;
//! destination.upload("data-collection-files", "uploads/a.csv", bytes, &options).await?;
//! ```

mod gcs;
mod mock;
mod secret_manager;
mod supabase;

pub use gcs::{GcsStorage, DEFAULT_STORAGE_ENDPOINT};
pub use mock::{MockCall, MockCloud, RecordedUpload};
pub use secret_manager::{SecretManager, DEFAULT_SECRET_MANAGER_ENDPOINT};
pub use supabase::{SupabaseConnector, SupabaseStorage};

use async_trait::async_trait;
use relay_types::{BackendError, ServiceRoleKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Read-only object storage.
#[async_trait]
pub trait SourceStorage: Send + Sync {
    /// Read the full content of `name` in `bucket`.
    async fn fetch_object(&self, bucket: &str, name: &str) -> Result<Vec<u8>, BackendError>;
}

/// Read-only secret store.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Read the latest version of `secret_name` in `project_id`.
    async fn access_latest(
        &self,
        project_id: &str,
        secret_name: &str,
    ) -> Result<ServiceRoleKey, BackendError>;
}

/// Builds authenticated destination clients.
pub trait DestinationConnector: Send + Sync {
    /// Create a client for the destination at `base_url` using `key`.
    fn connect(
        &self,
        base_url: &str,
        key: &ServiceRoleKey,
    ) -> Result<Box<dyn DestinationStorage>, BackendError>;
}

/// Writable object storage.
#[async_trait]
pub trait DestinationStorage: Send + Sync {
    /// Upload `body` to `path` inside `container`.
    async fn upload(
        &self,
        container: &str,
        path: &str,
        body: Vec<u8>,
        options: &FileOptions,
    ) -> Result<UploadResponse, BackendError>;
}

/// Per-upload options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOptions {
    /// MIME type stored with the object
    pub content_type: String,
    /// Overwrite an existing object instead of failing
    pub upsert: bool,
}

impl FileOptions {
    /// Options with upsert enabled.
    pub fn upsert(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            upsert: true,
        }
    }
}

/// Destination acknowledgement of an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// `<container>/<path>` of the stored object
    #[serde(rename = "Key")]
    pub key: String,
    /// Object id, when the backend reports one
    #[serde(rename = "Id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl fmt::Display for UploadResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "key={} id={}", self.key, id),
            None => write!(f, "key={}", self.key),
        }
    }
}
