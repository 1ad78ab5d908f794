//! Upload prefix scoping and destination path derivation.

/// Only objects under this prefix are relayed.
pub const UPLOAD_PREFIX: &str = "uploads/";

/// Whether an object name falls under [`UPLOAD_PREFIX`].
pub fn is_in_scope(name: &str) -> bool {
    name.starts_with(UPLOAD_PREFIX)
}

/// Object name with [`UPLOAD_PREFIX`] removed.
///
/// Returns `None` for names outside the prefix.
pub fn relative_name(name: &str) -> Option<&str> {
    name.strip_prefix(UPLOAD_PREFIX)
}

/// Destination object path for a relative name.
///
/// The destination keeps the prefix, so
/// `destination_path(relative_name(n)?) == n` for every in-scope `n`.
pub fn destination_path(relative: &str) -> String {
    format!("{UPLOAD_PREFIX}{relative}")
}
