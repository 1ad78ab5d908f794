//! Google Cloud Storage source backend (JSON API).

use super::SourceStorage;
use crate::auth::GoogleAuth;
use crate::http::{self, google_status_error, transport_error};
use async_trait::async_trait;
use relay_types::BackendError;

/// Public GCS endpoint.
pub const DEFAULT_STORAGE_ENDPOINT: &str = "https://storage.googleapis.com";

/// Reads objects through `GET /storage/v1/b/{bucket}/o/{object}?alt=media`.
#[derive(Debug, Clone)]
pub struct GcsStorage {
    endpoint: String,
    auth: GoogleAuth,
    http: reqwest::Client,
}

impl GcsStorage {
    /// Create a client for `endpoint` (the public API or an emulator).
    pub fn new(endpoint: impl Into<String>, auth: GoogleAuth) -> Result<Self, BackendError> {
        Ok(Self {
            endpoint: endpoint.into(),
            auth,
            http: http::client()?,
        })
    }

    /// Media download URL for an object.
    pub fn object_url(&self, bucket: &str, name: &str) -> Result<reqwest::Url, BackendError> {
        let mut url =
            http::join_segments(&self.endpoint, ["storage", "v1", "b", bucket, "o", name])?;
        url.query_pairs_mut().append_pair("alt", "media");
        Ok(url)
    }
}

#[async_trait]
impl SourceStorage for GcsStorage {
    async fn fetch_object(&self, bucket: &str, name: &str) -> Result<Vec<u8>, BackendError> {
        let url = self.object_url(bucket, name)?;
        let token = self.auth.access_token().await?;

        tracing::debug!("GET gs://{}/{}", bucket, name);
        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let resource = format!("gs://{}/{}", bucket, name);
            return Err(google_status_error(status, &resource, &body));
        }

        let bytes = response.bytes().await.map_err(transport_error)?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::Router;
    use std::collections::HashMap;

    async fn fake_gcs() -> String {
        let router = Router::new().route(
            "/storage/v1/b/:bucket/o/:object",
            get(
                |Path((bucket, object)): Path<(String, String)>,
                 Query(query): Query<HashMap<String, String>>,
                 headers: HeaderMap| async move {
                    let authorized = headers
                        .get("authorization")
                        .map(|v| v == "Bearer test-token")
                        .unwrap_or(false);
                    if !authorized {
                        return (StatusCode::UNAUTHORIZED, "missing token").into_response();
                    }
                    if query.get("alt").map(String::as_str) != Some("media") {
                        return (StatusCode::BAD_REQUEST, "metadata not supported").into_response();
                    }
                    match (bucket.as_str(), object.as_str()) {
                        ("b1", "uploads/session42/raw.csv") => "a,b\n1,2\n".into_response(),
                        ("locked", _) => (StatusCode::FORBIDDEN, "no access").into_response(),
                        ("flaky", _) => StatusCode::SERVICE_UNAVAILABLE.into_response(),
                        _ => (StatusCode::NOT_FOUND, "No such object").into_response(),
                    }
                },
            ),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn storage(endpoint: String) -> GcsStorage {
        GcsStorage::new(endpoint, GoogleAuth::Static("test-token".into())).unwrap()
    }

    #[test]
    fn object_url_encodes_name() {
        let gcs = storage(DEFAULT_STORAGE_ENDPOINT.to_string());
        let url = gcs.object_url("b1", "uploads/a b.csv").unwrap();
        assert_eq!(
            url.as_str(),
            "https://storage.googleapis.com/storage/v1/b/b1/o/uploads%2Fa%20b.csv?alt=media"
        );
    }

    #[tokio::test]
    async fn fetches_object_bytes() {
        let gcs = storage(fake_gcs().await);
        let bytes = gcs
            .fetch_object("b1", "uploads/session42/raw.csv")
            .await
            .unwrap();
        assert_eq!(bytes, b"a,b\n1,2\n");
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let gcs = storage(fake_gcs().await);
        let err = gcs
            .fetch_object("b1", "uploads/missing.csv")
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)));
    }

    #[tokio::test]
    async fn forbidden_is_permission_denied() {
        let gcs = storage(fake_gcs().await);
        let err = gcs.fetch_object("locked", "uploads/a").await.unwrap_err();
        assert!(matches!(err, BackendError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let gcs = storage(fake_gcs().await);
        let err = gcs.fetch_object("flaky", "uploads/a").await.unwrap_err();
        assert!(matches!(err, BackendError::Transient(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transient() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let gcs = storage(format!("http://{}", addr));
        let err = gcs.fetch_object("b1", "uploads/a").await.unwrap_err();
        assert!(matches!(err, BackendError::Transient(_)));
    }
}
