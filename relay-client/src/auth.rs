//! Google OAuth access tokens.
//!
//! On Cloud Run / Cloud Functions the runtime service account's token is
//! served by the metadata server. Outside Google Cloud a token can be
//! supplied directly (e.g. `gcloud auth print-access-token`).
//!
//! Tokens are requested per call and never cached.

use crate::http::{self, transport_error};
use relay_types::BackendError;
use serde::Deserialize;

/// Metadata server address inside Google Cloud.
pub const DEFAULT_METADATA_ENDPOINT: &str = "http://metadata.google.internal";

const TOKEN_PATH: [&str; 6] = [
    "computeMetadata",
    "v1",
    "instance",
    "service-accounts",
    "default",
    "token",
];

/// Source of Google access tokens.
#[derive(Clone)]
pub enum GoogleAuth {
    /// Ask the metadata server for the default service account's token.
    MetadataServer {
        /// Metadata server base URL
        endpoint: String,
        /// HTTP client
        http: reqwest::Client,
    },
    /// Use a fixed token.
    Static(String),
}

impl std::fmt::Debug for GoogleAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GoogleAuth::MetadataServer { endpoint, .. } => f
                .debug_struct("MetadataServer")
                .field("endpoint", endpoint)
                .finish_non_exhaustive(),
            GoogleAuth::Static(_) => f.write_str("Static(<redacted>)"),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl GoogleAuth {
    /// Metadata server token source.
    pub fn metadata_server(endpoint: impl Into<String>) -> Result<Self, BackendError> {
        Ok(GoogleAuth::MetadataServer {
            endpoint: endpoint.into(),
            http: http::client()?,
        })
    }

    /// Pick a token source: a fixed token when given, otherwise the
    /// metadata server at `metadata_endpoint`.
    pub fn from_settings(
        access_token: Option<&str>,
        metadata_endpoint: &str,
    ) -> Result<Self, BackendError> {
        match access_token {
            Some(token) if !token.trim().is_empty() => {
                Ok(GoogleAuth::Static(token.trim().to_string()))
            }
            _ => GoogleAuth::metadata_server(metadata_endpoint),
        }
    }

    /// Get an access token.
    pub async fn access_token(&self) -> Result<String, BackendError> {
        match self {
            GoogleAuth::Static(token) => Ok(token.clone()),
            GoogleAuth::MetadataServer { endpoint, http } => {
                let url = http::join_segments(endpoint, TOKEN_PATH)?;
                let response = http
                    .get(url)
                    .header("Metadata-Flavor", "Google")
                    .send()
                    .await
                    .map_err(transport_error)?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(BackendError::PermissionDenied(format!(
                        "metadata server token request failed ({}): {}",
                        status,
                        body.trim()
                    )));
                }

                let token: TokenResponse = response
                    .json()
                    .await
                    .map_err(|e| BackendError::InvalidResponse(format!("metadata token: {}", e)))?;
                Ok(token.access_token)
            }
        }
    }
}
