//! Error types for the upload relay.

use thiserror::Error;

/// Failures reported by an external backend (source storage, secret
/// store, destination storage).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Object or secret does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller lacks access to the resource
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Destination rejected the credential
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Destination storage limit hit
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Network failure or unexpected server error
    #[error("transient failure: {0}")]
    Transient(String),

    /// Backend answered with something we cannot interpret
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Request could not be built (bad URL, bad header value)
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Terminal failure of one relay invocation.
///
/// Skipped objects are not errors and have no variant here.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Reading the source object failed
    #[error("fetch of gs://{bucket}/{name} failed: {source}")]
    Fetch {
        /// Source bucket
        bucket: String,
        /// Source object name
        name: String,
        /// Backend failure
        #[source]
        source: BackendError,
    },

    /// Secret access or destination client construction failed
    #[error("destination authentication failed: {source}")]
    Auth {
        /// Backend failure
        #[source]
        source: BackendError,
    },

    /// Writing to the destination failed
    #[error("upload to {container}/{path} failed: {source}")]
    Push {
        /// Destination bucket
        container: String,
        /// Destination object path
        path: String,
        /// Backend failure
        #[source]
        source: BackendError,
    },
}

impl RelayError {
    /// Short stage label for structured log fields.
    pub fn stage(&self) -> &'static str {
        match self {
            RelayError::Fetch { .. } => "fetch",
            RelayError::Auth { .. } => "auth",
            RelayError::Push { .. } => "push",
        }
    }

    /// The underlying backend failure.
    pub fn backend_error(&self) -> &BackendError {
        match self {
            RelayError::Fetch { source, .. }
            | RelayError::Auth { source }
            | RelayError::Push { source, .. } => source,
        }
    }
}
