//! # upload-relay-server
//!
//! Copies objects uploaded under `uploads/` in a Google Cloud Storage
//! bucket into a Supabase Storage bucket.
//!
//! This crate implements a relay server that:
//! - Receives `object.finalized` CloudEvents over HTTP
//! - Ignores objects outside the `uploads/` prefix
//! - Downloads the object, fetches the service-role key, uploads with upsert
//! - Logs every failure and never asks the platform to retry
//!
//! ## Architecture
//!
//! ```text
//! GCS bucket ──event──►┌──────────────────────────┐
//!                      │     upload-relay         │
//!                      │  ┌────────────────────┐  │
//! Secret Manager ─────►│  │   RelayHandler     │  ├──upsert──► Supabase Storage
//!                      │  └────────────────────┘  │
//!                      └──────────────────────────┘
//! ```
//!
//! ## Endpoints
//!
//! - `POST /` CloudEvents receiver (binary or structured mode)
//! - `GET /health` liveness and version

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod server;
