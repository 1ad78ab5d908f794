//! Destination credential.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Supabase service-role key.
///
/// Fetched once per invocation and dropped with it. Both `Debug` and
/// `Display` print a placeholder so the key cannot reach a log line by
/// accident; the buffer is zeroed on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ServiceRoleKey(String);

impl ServiceRoleKey {
    /// Wrap a key. Surrounding whitespace (e.g. a trailing newline in the
    /// stored secret) is removed.
    pub fn new(key: impl Into<String>) -> Self {
        let mut raw = key.into();
        let trimmed = raw.trim().to_string();
        raw.zeroize();
        Self(trimmed)
    }

    /// Expose the key for building request headers.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the key is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ServiceRoleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ServiceRoleKey(<redacted>)")
    }
}

impl fmt::Display for ServiceRoleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}
