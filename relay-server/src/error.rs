//! Startup error types for the relay server.
//!
//! Per-event failures are [`relay_types::RelayError`] and never leave the
//! handler; these errors abort process start.

/// Main error type for server startup and shutdown.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Backend client could not be constructed.
    #[error("backend setup failed: {0}")]
    Backend(#[from] relay_types::BackendError),

    /// Failed to bind the HTTP listener.
    #[error("failed to bind {address}: {source}")]
    Bind {
        /// Requested address.
        address: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;
