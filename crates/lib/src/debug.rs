//! Inspection helpers for development builds.
//!
//! Compiled in debug builds and with the `testing` feature only.

use crate::storage::NamespacedStorage;

/// The active namespace prefix, e.g. `user:a@x.com:`.
pub fn current_namespace(storage: &NamespacedStorage) -> Option<String> {
    storage.namespace().map(|ns| ns.as_str().to_string())
}

/// Whether any namespace is active.
pub fn has_namespace(storage: &NamespacedStorage) -> bool {
    storage.namespace().is_some()
}
