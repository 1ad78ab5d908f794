//! Shared HTTP plumbing for the REST backends.

use relay_types::BackendError;
use reqwest::{StatusCode, Url};
use std::time::Duration;

/// Connect timeout for every backend client.
pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build a plain client with the relay's transport settings.
pub(crate) fn client() -> Result<reqwest::Client, BackendError> {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| BackendError::InvalidRequest(format!("http client: {}", e)))
}

/// Map a transport-level reqwest error.
pub(crate) fn transport_error(err: reqwest::Error) -> BackendError {
    if err.is_builder() {
        BackendError::InvalidRequest(err.to_string())
    } else {
        BackendError::Transient(err.to_string())
    }
}

/// Map a non-success status from a Google API.
pub(crate) fn google_status_error(status: StatusCode, resource: &str, body: &str) -> BackendError {
    let detail = if body.is_empty() {
        format!("{} ({})", resource, status)
    } else {
        format!("{} ({}): {}", resource, status, body.trim())
    };

    match status {
        StatusCode::NOT_FOUND => BackendError::NotFound(detail),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::PermissionDenied(detail),
        _ => BackendError::Transient(detail),
    }
}

/// Append path segments to a base URL, percent-encoding each one.
///
/// A `/` inside a segment is encoded, so a whole object name can be
/// passed as one segment.
pub(crate) fn join_segments<'a, I>(base: &str, segments: I) -> Result<Url, BackendError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut url = Url::parse(base)
        .map_err(|e| BackendError::InvalidRequest(format!("invalid base url {}: {}", base, e)))?;

    url.path_segments_mut()
        .map_err(|_| {
            BackendError::InvalidRequest(format!("base url cannot have a path: {}", base))
        })?
        .pop_if_empty()
        .extend(segments);

    Ok(url)
}
