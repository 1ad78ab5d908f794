//! Supabase Storage destination backend (REST).

use super::{DestinationConnector, DestinationStorage, FileOptions, UploadResponse};
use crate::http::{self, transport_error, CONNECT_TIMEOUT};
use async_trait::async_trait;
use relay_types::{BackendError, ServiceRoleKey};
use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;

/// Builds [`SupabaseStorage`] clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct SupabaseConnector;

impl SupabaseConnector {
    /// Create a connector.
    pub fn new() -> Self {
        Self
    }
}

impl DestinationConnector for SupabaseConnector {
    fn connect(
        &self,
        base_url: &str,
        key: &ServiceRoleKey,
    ) -> Result<Box<dyn DestinationStorage>, BackendError> {
        Ok(Box::new(SupabaseStorage::new(base_url, key)?))
    }
}

/// Client for `POST /storage/v1/object/{bucket}/{path}`.
///
/// Every request carries the service-role key both as bearer token and
/// `apikey` header.
#[derive(Debug)]
pub struct SupabaseStorage {
    base_url: String,
    http: reqwest::Client,
}

impl SupabaseStorage {
    /// Create an authenticated client.
    ///
    /// Fails with [`BackendError::Unauthorized`] when the key cannot be used
    /// as a header value, and [`BackendError::InvalidRequest`] for a bad URL.
    pub fn new(base_url: &str, key: &ServiceRoleKey) -> Result<Self, BackendError> {
        if key.is_empty() {
            return Err(BackendError::Unauthorized("service-role key is empty".into()));
        }

        // Validates the URL up front.
        http::join_segments(base_url, ["storage", "v1"])?;

        let invalid_key = |_: InvalidHeaderValue| {
            BackendError::Unauthorized("service-role key is not a valid header".into())
        };
        let mut bearer =
            HeaderValue::from_str(&format!("Bearer {}", key.expose())).map_err(invalid_key)?;
        bearer.set_sensitive(true);
        let mut apikey = HeaderValue::from_str(key.expose()).map_err(invalid_key)?;
        apikey.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);
        headers.insert("apikey", apikey);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| BackendError::InvalidRequest(format!("http client: {}", e)))?;

        Ok(Self {
            base_url: base_url.to_string(),
            http,
        })
    }

    /// Object URL; `path` keeps its `/` separators.
    ///
    /// `.` and `..` segments are rejected: URL normalization would collapse
    /// them and address a different object.
    pub fn object_url(&self, container: &str, path: &str) -> Result<reqwest::Url, BackendError> {
        if path.split('/').any(|segment| segment == "." || segment == "..") {
            return Err(BackendError::InvalidRequest(format!(
                "object path has a dot segment: {}",
                path
            )));
        }

        let segments = ["storage", "v1", "object", container]
            .into_iter()
            .chain(path.split('/'));
        http::join_segments(&self.base_url, segments)
    }
}

#[async_trait]
impl DestinationStorage for SupabaseStorage {
    async fn upload(
        &self,
        container: &str,
        path: &str,
        body: Vec<u8>,
        options: &FileOptions,
    ) -> Result<UploadResponse, BackendError> {
        let url = self.object_url(container, path)?;

        tracing::debug!(
            "POST {}/{} ({} bytes, upsert={})",
            container,
            path,
            body.len(),
            options.upsert
        );
        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, options.content_type.as_str())
            .header("x-upsert", if options.upsert { "true" } else { "false" })
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(classify_error(status, &text));
        }

        serde_json::from_str(&text)
            .map_err(|e| BackendError::InvalidResponse(format!("upload response: {}: {}", e, text)))
    }
}

/// Map a Supabase Storage error response onto the backend taxonomy.
///
/// The storage API wraps errors as `{"statusCode": "403", "error": ..., "message": ...}`
/// and may report a different status in the body than on the wire; the body
/// wins when it carries a valid code.
fn classify_error(status: StatusCode, body: &str) -> BackendError {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();

    let body_status = parsed
        .as_ref()
        .and_then(|v| v.get("statusCode"))
        .and_then(|code| match code {
            serde_json::Value::String(s) => s.parse::<u16>().ok(),
            serde_json::Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
            _ => None,
        })
        .and_then(|code| StatusCode::from_u16(code).ok());
    let effective = body_status.unwrap_or(status);

    let message = parsed
        .as_ref()
        .and_then(|v| v.get("message").or_else(|| v.get("error")))
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string());
    let detail = format!("{}: {}", effective, message);

    if message.to_ascii_lowercase().contains("quota") {
        return BackendError::QuotaExceeded(detail);
    }

    match effective {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Unauthorized(detail),
        StatusCode::PAYLOAD_TOO_LARGE
        | StatusCode::TOO_MANY_REQUESTS
        | StatusCode::INSUFFICIENT_STORAGE => BackendError::QuotaExceeded(detail),
        StatusCode::NOT_FOUND => BackendError::NotFound(detail),
        _ => BackendError::Transient(detail),
    }
}
