//! CloudEvents receiver.
//!
//! Accepts HTTP binary mode (`ce-*` headers, body is the event data) and
//! structured mode (`application/cloudevents+json`, body is the envelope).
//! Any event that decodes is acknowledged with 200, including failed syncs,
//! so the platform does not redeliver it.

use crate::server::UploadRelay;
use axum::body::Bytes;
use axum::http::{header::CONTENT_TYPE, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use relay_types::{CloudEvent, StorageObjectData};
use serde::Serialize;
use std::sync::Arc;

const STRUCTURED_CONTENT_TYPE: &str = "application/cloudevents+json";

/// Errors decoding an incoming event.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// Body is not valid JSON of the expected shape.
    #[error("invalid event body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    /// A required binary-mode header is absent.
    #[error("missing CloudEvents attribute: {0}")]
    MissingAttribute(&'static str),

    /// A binary-mode header is not valid text.
    #[error("invalid CloudEvents attribute: {0}")]
    InvalidAttribute(&'static str),
}

/// Acknowledgement body.
#[derive(Debug, Clone, Serialize)]
pub struct EventAck {
    /// `skipped`, `synced` or `failed`.
    pub status: &'static str,
    /// Id of the processed event.
    pub event_id: String,
}

/// Decode a CloudEvent from request headers and body.
pub fn decode_event(
    headers: &HeaderMap,
    body: &[u8],
) -> Result<CloudEvent<StorageObjectData>, EventError> {
    let structured = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with(STRUCTURED_CONTENT_TYPE))
        .unwrap_or(false);

    if structured {
        return Ok(serde_json::from_slice(body)?);
    }

    let attribute = |name: &'static str| -> Result<Option<String>, EventError> {
        headers
            .get(name)
            .map(|v| {
                v.to_str()
                    .map(str::to_string)
                    .map_err(|_| EventError::InvalidAttribute(name))
            })
            .transpose()
    };
    let required = |name: &'static str| -> Result<String, EventError> {
        attribute(name)?.ok_or(EventError::MissingAttribute(name))
    };

    Ok(CloudEvent {
        id: required("ce-id")?,
        source: required("ce-source")?,
        event_type: required("ce-type")?,
        specversion: attribute("ce-specversion")?.unwrap_or_else(|| "1.0".to_string()),
        subject: attribute("ce-subject")?,
        time: attribute("ce-time")?,
        datacontenttype: attribute("content-type")?,
        data: serde_json::from_slice(body)?,
    })
}

/// `POST /` handler.
pub async fn event_handler(
    Extension(relay): Extension<Arc<UploadRelay>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let event = match decode_event(&headers, &body) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Rejected event: {}", e);
            let body = serde_json::json!({ "error": e.to_string() });
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        }
    };

    tracing::debug!(
        "Event {} ({}) from {}",
        event.id,
        event.event_type,
        event.source
    );

    let outcome = relay.handler().handle(&event.data).await;

    Json(EventAck {
        status: outcome.status(),
        event_id: event.id,
    })
    .into_response()
}
