//! Configuration loading for the upload relay.
//!
//! Configuration is read once at startup: an optional TOML file, then
//! environment variables on top. Every field except the destination URL
//! has a default.

use relay_client::{
    DEFAULT_METADATA_ENDPOINT, DEFAULT_SECRET_MANAGER_ENDPOINT, DEFAULT_STORAGE_ENDPOINT,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Google Cloud configuration.
    #[serde(default)]
    pub gcp: GcpConfig,
    /// Destination (Supabase) configuration.
    #[serde(default)]
    pub destination: DestinationConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the CloudEvents receiver (default: 0.0.0.0:8080).
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

/// Google Cloud configuration.
#[derive(Clone, Deserialize)]
pub struct GcpConfig {
    /// Project that owns the service-role secret.
    #[serde(default = "default_project_id")]
    pub project_id: String,
    /// Secret holding the Supabase service-role key.
    #[serde(default = "default_secret_name")]
    pub secret_name: String,
    /// Cloud Storage API base URL.
    #[serde(default = "default_storage_endpoint")]
    pub storage_endpoint: String,
    /// Secret Manager API base URL.
    #[serde(default = "default_secret_manager_endpoint")]
    pub secret_manager_endpoint: String,
    /// Metadata server base URL (token source inside Google Cloud).
    #[serde(default = "default_metadata_endpoint")]
    pub metadata_endpoint: String,
    /// Fixed access token; when set the metadata server is not used.
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Destination configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DestinationConfig {
    /// Supabase project URL. Required.
    #[serde(default)]
    pub url: String,
    /// Supabase Storage bucket (default: data-collection-files).
    #[serde(default = "default_destination_bucket")]
    pub bucket: String,
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_project_id() -> String {
    "fake-profile-detection-460117".to_string()
}

fn default_secret_name() -> String {
    "supabase-service-role-key".to_string()
}

fn default_storage_endpoint() -> String {
    DEFAULT_STORAGE_ENDPOINT.to_string()
}

fn default_secret_manager_endpoint() -> String {
    DEFAULT_SECRET_MANAGER_ENDPOINT.to_string()
}

fn default_metadata_endpoint() -> String {
    DEFAULT_METADATA_ENDPOINT.to_string()
}

fn default_destination_bucket() -> String {
    "data-collection-files".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

impl Default for GcpConfig {
    fn default() -> Self {
        Self {
            project_id: default_project_id(),
            secret_name: default_secret_name(),
            storage_endpoint: default_storage_endpoint(),
            secret_manager_endpoint: default_secret_manager_endpoint(),
            metadata_endpoint: default_metadata_endpoint(),
            access_token: None,
        }
    }
}

impl std::fmt::Debug for GcpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcpConfig")
            .field("project_id", &self.project_id)
            .field("secret_name", &self.secret_name)
            .field("storage_endpoint", &self.storage_endpoint)
            .field("secret_manager_endpoint", &self.secret_manager_endpoint)
            .field("metadata_endpoint", &self.metadata_endpoint)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            bucket: default_destination_bucket(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Load configuration from the process environment only.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load the optional file, overlay the process environment, validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay values from an environment lookup.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `PORT` | `server.bind_address` (`0.0.0.0:$PORT`) |
    /// | `GCP_PROJECT`, `GOOGLE_CLOUD_PROJECT` | `gcp.project_id` |
    /// | `SECRET_NAME` | `gcp.secret_name` |
    /// | `STORAGE_EMULATOR_HOST` | `gcp.storage_endpoint` |
    /// | `SECRET_MANAGER_ENDPOINT` | `gcp.secret_manager_endpoint` |
    /// | `GCE_METADATA_HOST` | `gcp.metadata_endpoint` |
    /// | `GOOGLE_OAUTH_ACCESS_TOKEN` | `gcp.access_token` |
    /// | `SUPABASE_URL` | `destination.url` |
    /// | `SUPABASE_BUCKET_NAME` | `destination.bucket` |
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(port) = var("PORT") {
            let port: u16 = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: "PORT",
                reason: format!("not a port number: {}", port),
            })?;
            self.server.bind_address = format!("0.0.0.0:{}", port);
        }
        if let Some(project) = var("GCP_PROJECT").or_else(|| var("GOOGLE_CLOUD_PROJECT")) {
            self.gcp.project_id = project;
        }
        if let Some(secret) = var("SECRET_NAME") {
            self.gcp.secret_name = secret;
        }
        if let Some(host) = var("STORAGE_EMULATOR_HOST") {
            self.gcp.storage_endpoint = with_scheme(&host);
        }
        if let Some(endpoint) = var("SECRET_MANAGER_ENDPOINT") {
            self.gcp.secret_manager_endpoint = with_scheme(&endpoint);
        }
        if let Some(host) = var("GCE_METADATA_HOST") {
            self.gcp.metadata_endpoint = with_scheme(&host);
        }
        if let Some(token) = var("GOOGLE_OAUTH_ACCESS_TOKEN") {
            self.gcp.access_token = Some(token);
        }
        if let Some(url) = var("SUPABASE_URL") {
            self.destination.url = url;
        }
        if let Some(bucket) = var("SUPABASE_BUCKET_NAME") {
            self.destination.bucket = bucket;
        }
        Ok(())
    }

    /// Check required fields.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.destination.url.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "destination.url",
                env: "SUPABASE_URL",
            });
        }
        if self.destination.bucket.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "destination.bucket",
                env: "SUPABASE_BUCKET_NAME",
            });
        }
        if self.gcp.project_id.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "gcp.project_id",
                env: "GCP_PROJECT",
            });
        }
        Ok(())
    }
}

/// Hosts given as `host:port` (the emulator convention) get `http://`.
fn with_scheme(value: &str) -> String {
    let value = value.trim();
    if value.starts_with("http://") || value.starts_with("https://") {
        value.trim_end_matches('/').to_string()
    } else {
        format!("http://{}", value.trim_end_matches('/'))
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// Required value not provided.
    #[error("missing {field} (set {env})")]
    Missing {
        /// Config field.
        field: &'static str,
        /// Environment variable that provides it.
        env: &'static str,
    },
    /// Value present but unusable.
    #[error("invalid {field}: {reason}")]
    InvalidValue {
        /// Config field or variable.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn default_config_values() {
        let config = Config::default();
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert_eq!(config.gcp.project_id, "fake-profile-detection-460117");
        assert_eq!(config.gcp.secret_name, "supabase-service-role-key");
        assert_eq!(config.gcp.storage_endpoint, "https://storage.googleapis.com");
        assert_eq!(config.destination.bucket, "data-collection-files");
        assert!(config.gcp.access_token.is_none());
    }

    #[test]
    fn default_config_needs_destination_url() {
        let err = Config::default().validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Missing {
                env: "SUPABASE_URL",
                ..
            }
        ));
    }

    #[test]
    fn env_overlay() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("PORT", "9090"),
                ("GCP_PROJECT", "proj-a"),
                ("SUPABASE_URL", "https://xyz.supabase.co"),
                ("SUPABASE_BUCKET_NAME", "other-bucket"),
                ("STORAGE_EMULATOR_HOST", "localhost:4443"),
                ("GCE_METADATA_HOST", "169.254.169.254"),
            ]))
            .unwrap();

        assert_eq!(config.server.bind_address, "0.0.0.0:9090");
        assert_eq!(config.gcp.project_id, "proj-a");
        assert_eq!(config.destination.url, "https://xyz.supabase.co");
        assert_eq!(config.destination.bucket, "other-bucket");
        assert_eq!(config.gcp.storage_endpoint, "http://localhost:4443");
        assert_eq!(config.gcp.metadata_endpoint, "http://169.254.169.254");
        config.validate().unwrap();
    }

    #[test]
    fn unset_bucket_keeps_default() {
        let mut config = Config::default();
        config
            .apply_env(env(&[
                ("SUPABASE_URL", "https://xyz.supabase.co"),
                ("SUPABASE_BUCKET_NAME", ""),
            ]))
            .unwrap();
        assert_eq!(config.destination.bucket, "data-collection-files");
    }

    #[test]
    fn google_cloud_project_is_fallback() {
        let mut config = Config::default();
        config
            .apply_env(env(&[("GOOGLE_CLOUD_PROJECT", "proj-b")]))
            .unwrap();
        assert_eq!(config.gcp.project_id, "proj-b");

        config
            .apply_env(env(&[
                ("GCP_PROJECT", "proj-a"),
                ("GOOGLE_CLOUD_PROJECT", "proj-b"),
            ]))
            .unwrap();
        assert_eq!(config.gcp.project_id, "proj-a");
    }

    #[test]
    fn bad_port_rejected() {
        let mut config = Config::default();
        let err = config.apply_env(env(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "PORT", .. }));
    }

    #[test]
    fn config_from_toml_string() {
        let toml = r#"
[server]
bind_address = "127.0.0.1:5000"

[gcp]
project_id = "proj-file"
access_token = "ya29.file"

[destination]
url = "https://abc.supabase.co"
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:5000");
        assert_eq!(config.gcp.project_id, "proj-file");
        assert_eq!(config.gcp.secret_name, "supabase-service-role-key");
        assert_eq!(config.gcp.access_token.as_deref(), Some("ya29.file"));
        assert_eq!(config.destination.url, "https://abc.supabase.co");
        assert_eq!(config.destination.bucket, "data-collection-files");
    }

    #[test]
    fn config_missing_sections_use_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert_eq!(config.destination.bucket, "data-collection-files");
    }

    #[test]
    fn config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[destination]\nurl = \"https://file.supabase.co\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.destination.url, "https://file.supabase.co");
    }

    #[test]
    fn unreadable_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_file(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[destination\nurl = ").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn access_token_not_in_debug() {
        let mut config = Config::default();
        config.gcp.access_token = Some("ya29.secret".into());
        assert!(!format!("{:?}", config).contains("ya29.secret"));
    }
}
