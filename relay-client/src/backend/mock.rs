//! Mock backends for testing.
//!
//! [`MockCloud`] plays source storage, secret store and destination at once
//! so a single call journal records the order of every backend call.

use super::{
    DestinationConnector, DestinationStorage, FileOptions, SecretStore, SourceStorage,
    UploadResponse,
};
use async_trait::async_trait;
use relay_types::{BackendError, ServiceRoleKey};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A backend call observed by [`MockCloud`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    /// `SourceStorage::fetch_object`
    Fetch {
        /// Requested bucket
        bucket: String,
        /// Requested object
        name: String,
    },
    /// `SecretStore::access_latest`
    AccessSecret {
        /// Requested project
        project_id: String,
        /// Requested secret
        secret_name: String,
    },
    /// `DestinationConnector::connect`
    Connect {
        /// Destination base URL
        base_url: String,
    },
    /// `DestinationStorage::upload`
    Upload {
        /// Destination container
        container: String,
        /// Destination path
        path: String,
    },
}

/// An upload accepted by the mock destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpload {
    /// Destination container
    pub container: String,
    /// Destination path
    pub path: String,
    /// Uploaded bytes
    pub body: Vec<u8>,
    /// Content type option
    pub content_type: String,
    /// Upsert option
    pub upsert: bool,
    /// Key the destination client was built with
    pub key: String,
}

/// In-memory stand-in for every relay backend.
///
/// Clones share state.
#[derive(Debug, Default)]
pub struct MockCloud {
    inner: Arc<Mutex<MockCloudInner>>,
}

#[derive(Debug, Default)]
struct MockCloudInner {
    objects: HashMap<(String, String), Vec<u8>>,
    secrets: HashMap<(String, String), String>,
    calls: Vec<MockCall>,
    uploads: Vec<RecordedUpload>,
    fail_next_fetch: Option<BackendError>,
    fail_next_secret: Option<BackendError>,
    fail_next_connect: Option<BackendError>,
    fail_next_upload: Option<BackendError>,
}

impl MockCloud {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object for `fetch_object`.
    pub fn put_object(&self, bucket: &str, name: &str, body: impl Into<Vec<u8>>) {
        let mut inner = self.inner.lock().unwrap();
        inner
            .objects
            .insert((bucket.to_string(), name.to_string()), body.into());
    }

    /// Store a secret for `access_latest`.
    pub fn put_secret(&self, project_id: &str, secret_name: &str, value: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.secrets.insert(
            (project_id.to_string(), secret_name.to_string()),
            value.to_string(),
        );
    }

    /// Cause the next `fetch_object()` to fail.
    pub fn fail_next_fetch(&self, error: BackendError) {
        self.inner.lock().unwrap().fail_next_fetch = Some(error);
    }

    /// Cause the next `access_latest()` to fail.
    pub fn fail_next_secret(&self, error: BackendError) {
        self.inner.lock().unwrap().fail_next_secret = Some(error);
    }

    /// Cause the next `connect()` to fail.
    pub fn fail_next_connect(&self, error: BackendError) {
        self.inner.lock().unwrap().fail_next_connect = Some(error);
    }

    /// Cause the next `upload()` to fail.
    pub fn fail_next_upload(&self, error: BackendError) {
        self.inner.lock().unwrap().fail_next_upload = Some(error);
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Every accepted upload, in order.
    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.inner.lock().unwrap().uploads.clone()
    }

    /// Clear objects, secrets, journal and forced failures.
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MockCloudInner::default();
    }
}

impl Clone for MockCloud {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl SourceStorage for MockCloud {
    async fn fetch_object(&self, bucket: &str, name: &str) -> Result<Vec<u8>, BackendError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(MockCall::Fetch {
            bucket: bucket.to_string(),
            name: name.to_string(),
        });

        if let Some(error) = inner.fail_next_fetch.take() {
            return Err(error);
        }

        inner
            .objects
            .get(&(bucket.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("gs://{}/{}", bucket, name)))
    }
}

#[async_trait]
impl SecretStore for MockCloud {
    async fn access_latest(
        &self,
        project_id: &str,
        secret_name: &str,
    ) -> Result<ServiceRoleKey, BackendError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(MockCall::AccessSecret {
            project_id: project_id.to_string(),
            secret_name: secret_name.to_string(),
        });

        if let Some(error) = inner.fail_next_secret.take() {
            return Err(error);
        }

        inner
            .secrets
            .get(&(project_id.to_string(), secret_name.to_string()))
            .map(|value| ServiceRoleKey::new(value.as_str()))
            .ok_or_else(|| {
                BackendError::NotFound(format!("projects/{}/secrets/{}", project_id, secret_name))
            })
    }
}

impl DestinationConnector for MockCloud {
    fn connect(
        &self,
        base_url: &str,
        key: &ServiceRoleKey,
    ) -> Result<Box<dyn DestinationStorage>, BackendError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(MockCall::Connect {
            base_url: base_url.to_string(),
        });

        if let Some(error) = inner.fail_next_connect.take() {
            return Err(error);
        }

        Ok(Box::new(MockDestination {
            inner: Arc::clone(&self.inner),
            key: key.clone(),
        }))
    }
}

/// Destination client handed out by [`MockCloud::connect`].
struct MockDestination {
    inner: Arc<Mutex<MockCloudInner>>,
    key: ServiceRoleKey,
}

#[async_trait]
impl DestinationStorage for MockDestination {
    async fn upload(
        &self,
        container: &str,
        path: &str,
        body: Vec<u8>,
        options: &FileOptions,
    ) -> Result<UploadResponse, BackendError> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(MockCall::Upload {
            container: container.to_string(),
            path: path.to_string(),
        });

        if let Some(error) = inner.fail_next_upload.take() {
            return Err(error);
        }

        inner.uploads.push(RecordedUpload {
            container: container.to_string(),
            path: path.to_string(),
            body,
            content_type: options.content_type.clone(),
            upsert: options.upsert,
            key: self.key.expose().to_string(),
        });

        Ok(UploadResponse {
            key: format!("{}/{}", container, path),
            id: Some(format!("mock-{}", inner.uploads.len())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_stored_objects() {
        let cloud = MockCloud::new();
        cloud.put_object("b1", "uploads/a", b"hello".to_vec());

        assert_eq!(
            cloud.fetch_object("b1", "uploads/a").await.unwrap(),
            b"hello"
        );
        assert!(matches!(
            cloud.fetch_object("b1", "uploads/missing").await,
            Err(BackendError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn serves_stored_secrets() {
        let cloud = MockCloud::new();
        cloud.put_secret("p1", "s1", "value");

        let key = cloud.access_latest("p1", "s1").await.unwrap();
        assert_eq!(key.expose(), "value");
        assert!(matches!(
            cloud.access_latest("p1", "other").await,
            Err(BackendError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn forced_failures_apply_once() {
        let cloud = MockCloud::new();
        cloud.put_object("b1", "uploads/a", b"x".to_vec());
        cloud.fail_next_fetch(BackendError::Transient("reset".into()));

        assert!(cloud.fetch_object("b1", "uploads/a").await.is_err());
        assert!(cloud.fetch_object("b1", "uploads/a").await.is_ok());
    }

    #[tokio::test]
    async fn journal_records_order_across_clones() {
        let cloud = MockCloud::new();
        let other = cloud.clone();
        cloud.put_object("b1", "uploads/a", b"x".to_vec());
        cloud.put_secret("p1", "s1", "k");

        other.fetch_object("b1", "uploads/a").await.unwrap();
        let key = other.access_latest("p1", "s1").await.unwrap();
        let destination = other.connect("https://dest", &key).unwrap();
        destination
            .upload(
                "c",
                "uploads/a",
                b"x".to_vec(),
                &FileOptions::upsert("text/plain"),
            )
            .await
            .unwrap();

        assert_eq!(
            cloud.calls(),
            vec![
                MockCall::Fetch {
                    bucket: "b1".into(),
                    name: "uploads/a".into()
                },
                MockCall::AccessSecret {
                    project_id: "p1".into(),
                    secret_name: "s1".into()
                },
                MockCall::Connect {
                    base_url: "https://dest".into()
                },
                MockCall::Upload {
                    container: "c".into(),
                    path: "uploads/a".into()
                },
            ]
        );

        let uploads = cloud.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].key, "k");
        assert!(uploads[0].upsert);
    }

    #[tokio::test]
    async fn reset_clears_all() {
        let cloud = MockCloud::new();
        cloud.put_object("b1", "uploads/a", b"x".to_vec());
        cloud.fetch_object("b1", "uploads/a").await.unwrap();

        cloud.reset();

        assert!(cloud.calls().is_empty());
        assert!(cloud.fetch_object("b1", "uploads/a").await.is_err());
    }
}
