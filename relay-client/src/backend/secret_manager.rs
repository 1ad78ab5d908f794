//! Google Secret Manager backend (REST v1).

use super::SecretStore;
use crate::auth::GoogleAuth;
use crate::http::{self, google_status_error, transport_error};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use relay_types::{BackendError, ServiceRoleKey};
use serde::Deserialize;
use zeroize::Zeroizing;

/// Public Secret Manager endpoint.
pub const DEFAULT_SECRET_MANAGER_ENDPOINT: &str = "https://secretmanager.googleapis.com";

/// Reads secrets through
/// `GET /v1/projects/{project}/secrets/{secret}/versions/latest:access`.
#[derive(Debug, Clone)]
pub struct SecretManager {
    endpoint: String,
    auth: GoogleAuth,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct AccessSecretVersionResponse {
    payload: SecretPayload,
}

#[derive(Deserialize)]
struct SecretPayload {
    data: String,
}

impl SecretManager {
    /// Create a client for `endpoint`.
    pub fn new(endpoint: impl Into<String>, auth: GoogleAuth) -> Result<Self, BackendError> {
        Ok(Self {
            endpoint: endpoint.into(),
            auth,
            http: http::client()?,
        })
    }

    /// Access URL for the latest version of a secret.
    pub fn latest_version_url(
        &self,
        project_id: &str,
        secret_name: &str,
    ) -> Result<reqwest::Url, BackendError> {
        http::join_segments(
            &self.endpoint,
            [
                "v1",
                "projects",
                project_id,
                "secrets",
                secret_name,
                "versions",
                "latest:access",
            ],
        )
    }
}

#[async_trait]
impl SecretStore for SecretManager {
    async fn access_latest(
        &self,
        project_id: &str,
        secret_name: &str,
    ) -> Result<ServiceRoleKey, BackendError> {
        let url = self.latest_version_url(project_id, secret_name)?;
        let token = self.auth.access_token().await?;

        tracing::debug!("Accessing secret {}/{} (latest)", project_id, secret_name);
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
            let resource = format!("projects/{}/secrets/{}", project_id, secret_name);
            return Err(google_status_error(status, &resource, &body));
        }

        let body: AccessSecretVersionResponse = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(format!("secret payload: {}", e)))?;

        let decoded = Zeroizing::new(
            STANDARD
                .decode(body.payload.data.as_bytes())
                .map_err(|e| BackendError::InvalidResponse(format!("secret payload: {}", e)))?,
        );
        let text = std::str::from_utf8(&decoded).map_err(|_| {
            BackendError::InvalidResponse("secret payload is not UTF-8".to_string())
        })?;

        Ok(ServiceRoleKey::new(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};

    async fn fake_secret_manager() -> String {
        let router = Router::new().route(
            "/v1/projects/:project/secrets/:secret/versions/:version",
            get(
                |Path((project, secret, version)): Path<(String, String, String)>,
                 headers: HeaderMap| async move {
                    if headers.get("authorization").is_none() {
                        return StatusCode::UNAUTHORIZED.into_response();
                    }
                    if version != "latest:access" {
                        return StatusCode::BAD_REQUEST.into_response();
                    }
                    let data = match (project.as_str(), secret.as_str()) {
                        ("p1", "supabase-service-role-key") => STANDARD.encode("service-key-123\n"),
                        ("p1", "binary") => STANDARD.encode([0xffu8, 0xfe]),
                        ("p1", "garbled") => "***".to_string(),
                        ("denied", _) => return StatusCode::FORBIDDEN.into_response(),
                        _ => return StatusCode::NOT_FOUND.into_response(),
                    };
                    Json(serde_json::json!({
                        "name": format!("projects/{}/secrets/{}/versions/1", project, secret),
                        "payload": { "data": data }
                    }))
                    .into_response()
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

    async fn secret_manager() -> SecretManager {
        SecretManager::new(fake_secret_manager().await, GoogleAuth::Static("t".into())).unwrap()
    }

    #[test]
    fn latest_version_url_shape() {
        let sm =
            SecretManager::new(DEFAULT_SECRET_MANAGER_ENDPOINT, GoogleAuth::Static("t".into()))
                .unwrap();
        let url = sm
            .latest_version_url("p1", "supabase-service-role-key")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://secretmanager.googleapis.com/v1/projects/p1/secrets/supabase-service-role-key/versions/latest:access"
        );
    }

    #[tokio::test]
    async fn decodes_latest_version() {
        let sm = secret_manager().await;
        let key = sm
            .access_latest("p1", "supabase-service-role-key")
            .await
            .unwrap();
        assert_eq!(key.expose(), "service-key-123");
    }

    #[tokio::test]
    async fn missing_secret_is_not_found() {
        let sm = secret_manager().await;
        let err = sm.access_latest("p1", "nope").await.unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)));
    }

    #[tokio::test]
    async fn forbidden_is_permission_denied() {
        let sm = secret_manager().await;
        let err = sm.access_latest("denied", "x").await.unwrap_err();
        assert!(matches!(err, BackendError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn undecodable_payloads_are_invalid() {
        let sm = secret_manager().await;

        let err = sm.access_latest("p1", "binary").await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidResponse(_)));

        let err = sm.access_latest("p1", "garbled").await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidResponse(_)));
    }
}
