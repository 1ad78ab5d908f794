//! # relay-client
//!
//! External backends used by the upload relay.
//!
//! ## Backends
//!
//! | Trait | Production | Purpose |
//! |-------|------------|---------|
//! | [`SourceStorage`] | [`GcsStorage`] | Read object bytes from Google Cloud Storage |
//! | [`SecretStore`] | [`SecretManager`] | Read the latest service-role key |
//! | [`DestinationConnector`] | [`SupabaseConnector`] | Build an authenticated Supabase Storage client |
//!
//! [`MockCloud`] implements all three for tests.
//!
//! Google calls authenticate with an OAuth access token from
//! [`GoogleAuth`] (metadata server or a fixed token).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod backend;
mod http;

pub use auth::{GoogleAuth, DEFAULT_METADATA_ENDPOINT};
pub use backend::{
    DestinationConnector, DestinationStorage, FileOptions, GcsStorage, MockCall, MockCloud,
    RecordedUpload, SecretManager, SecretStore, SourceStorage, SupabaseConnector,
    SupabaseStorage, UploadResponse, DEFAULT_SECRET_MANAGER_ENDPOINT, DEFAULT_STORAGE_ENDPOINT,
};
