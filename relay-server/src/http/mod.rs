//! HTTP endpoints for the upload relay.
//!
//! Provides the CloudEvents receiver and a health check.

pub mod event;
pub mod health;

use crate::server::UploadRelay;
use axum::{
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;

pub use event::{decode_event, EventAck, EventError};
pub use health::{HealthStatus, TokenSource};

/// Build the HTTP router with all endpoints.
pub fn build_router(relay: Arc<UploadRelay>) -> Router {
    Router::new()
        .route("/", post(event::event_handler))
        .route("/health", get(health::health_handler))
        .layer(Extension(relay))
}
