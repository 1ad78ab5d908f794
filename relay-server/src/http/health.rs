//! `GET /health`: liveness plus the routing the relay was started with.

use crate::config::Config;
use crate::server::UploadRelay;
use axum::{Extension, Json};
use serde::Serialize;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

static START_TIME: OnceLock<Instant> = OnceLock::new();

/// Record process start for uptime reporting. Later calls are no-ops.
pub fn init_start_time() {
    START_TIME.get_or_init(Instant::now);
}

/// Where Google access tokens come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenSource {
    /// Instance metadata server.
    Metadata,
    /// Fixed token from configuration.
    Static,
}

/// Health response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Always `ok` while the process serves requests.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Project whose Secret Manager holds the service-role key.
    pub project_id: String,
    /// Supabase bucket objects are copied into.
    pub destination_bucket: String,
    /// Google token source in use.
    pub token_source: TokenSource,
    /// Seconds since [`init_start_time`].
    pub uptime_seconds: u64,
}

impl HealthStatus {
    /// Build a report from the relay configuration. Secrets and URLs are
    /// not included.
    pub fn from_config(config: &Config) -> Self {
        let token_source = if config.gcp.access_token.is_some() {
            TokenSource::Static
        } else {
            TokenSource::Metadata
        };

        Self {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            project_id: config.gcp.project_id.clone(),
            destination_bucket: config.destination.bucket.clone(),
            token_source,
            uptime_seconds: START_TIME
                .get()
                .map_or(0, |start| start.elapsed().as_secs()),
        }
    }
}

/// Health check handler.
pub async fn health_handler(Extension(relay): Extension<Arc<UploadRelay>>) -> Json<HealthStatus> {
    Json(HealthStatus::from_config(relay.config()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_routing_without_secrets() {
        let mut config = Config::default();
        config.destination.url = "https://xyz.supabase.co".into();
        config.gcp.access_token = Some("ya29.secret".into());

        let status = HealthStatus::from_config(&config);
        assert_eq!(status.token_source, TokenSource::Static);
        assert_eq!(status.project_id, "fake-profile-detection-460117");

        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"token_source\":\"static\""));
        assert!(json.contains("\"destination_bucket\":\"data-collection-files\""));
        assert!(!json.contains("ya29"));
        assert!(!json.contains("supabase.co"));
    }

    #[test]
    fn metadata_source_by_default() {
        let status = HealthStatus::from_config(&Config::default());
        assert_eq!(status.token_source, TokenSource::Metadata);
        assert_eq!(status.status, "ok");
    }
}
