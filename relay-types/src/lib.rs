//! # relay-types
//!
//! Shared types for the upload relay.
//!
//! This crate provides the foundational types used across all relay crates:
//! - [`StorageObjectData`], [`CloudEvent`] - The storage change notification
//! - [`UPLOAD_PREFIX`], [`relative_name`], [`destination_path`] - Path scoping
//! - [`ServiceRoleKey`] - Destination credential (redacted, zeroed on drop)
//! - [`BackendError`], [`RelayError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod event;
mod path;
mod secret;

pub use error::{BackendError, RelayError};
pub use event::{CloudEvent, StorageObjectData, DEFAULT_CONTENT_TYPE, OBJECT_FINALIZED};
pub use path::{destination_path, is_in_scope, relative_name, UPLOAD_PREFIX};
pub use secret::ServiceRoleKey;
