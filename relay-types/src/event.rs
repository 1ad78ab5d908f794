//! Storage change notifications.
//!
//! The hosting platform delivers a CloudEvent whose `data` is the GCS
//! object resource. Only `bucket`, `name` and `contentType` drive the
//! relay; everything else is carried for logging.

use serde::{Deserialize, Serialize};

/// Content type used when the notification carries none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// CloudEvent type emitted when an object finishes uploading.
pub const OBJECT_FINALIZED: &str = "google.cloud.storage.object.v1.finalized";

/// The object attributes carried by a storage notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageObjectData {
    /// Source bucket
    pub bucket: String,
    /// Full object path inside the bucket
    pub name: String,
    /// MIME type recorded on the object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Object size; GCS encodes it as a decimal string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Object generation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<String>,
}

impl StorageObjectData {
    /// Create notification data with only the fields the relay consumes.
    pub fn new(bucket: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            name: name.into(),
            content_type: None,
            size: None,
            generation: None,
        }
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Content type to use for the upload.
    ///
    /// Missing or blank values fall back to [`DEFAULT_CONTENT_TYPE`].
    pub fn content_type_or_default(&self) -> &str {
        match self.content_type.as_deref() {
            Some(ct) if !ct.trim().is_empty() => ct,
            _ => DEFAULT_CONTENT_TYPE,
        }
    }
}

/// A CloudEvents 1.0 envelope in structured JSON form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudEvent<T> {
    /// Event id, unique per source
    pub id: String,
    /// Event producer
    pub source: String,
    /// Event type, e.g. [`OBJECT_FINALIZED`]
    #[serde(rename = "type")]
    pub event_type: String,
    /// CloudEvents `specversion` attribute
    #[serde(default = "default_spec_version")]
    pub specversion: String,
    /// Subject, `objects/<name>` for storage events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Timestamp of the occurrence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Media type of `data`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacontenttype: Option<String>,
    /// Event payload
    pub data: T,
}

fn default_spec_version() -> String {
    "1.0".to_string()
}
