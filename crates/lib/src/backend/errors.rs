//! Error types for the raw storage backends.

use thiserror::Error;

/// Errors that can occur inside a storage backend.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BackendError {
    /// Writing the value would exceed the store's byte quota.
    #[error("Quota of {limit} bytes exceeded while writing '{key}'")]
    QuotaExceeded {
        /// Key being written
        key: String,
        /// Configured quota in bytes
        limit: usize,
    },

    /// The store cannot be used at all.
    #[error("Storage unavailable: {reason}")]
    Unavailable {
        /// Why the store is unavailable
        reason: String,
    },

    /// File I/O failed.
    #[error("File I/O error: {source}")]
    FileIo {
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Snapshot could not be serialized.
    #[error("Serialization failed: {source}")]
    SerializationFailed {
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Snapshot could not be deserialized.
    #[error("Deserialization failed: {source}")]
    DeserializationFailed {
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Snapshot was written by an incompatible version.
    #[error("Unsupported snapshot version {version}")]
    UnsupportedVersion {
        /// Version found in the snapshot
        version: u8,
    },

    /// A lock guarding the store was poisoned by a panicking thread.
    #[error("Storage lock poisoned")]
    LockPoisoned,
}

impl BackendError {
    /// Check if this error is a quota violation.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, BackendError::QuotaExceeded { .. })
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        matches!(self, BackendError::FileIo { .. })
    }

    /// Check if the persisted data is corrupt or incompatible.
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            BackendError::DeserializationFailed { .. } | BackendError::UnsupportedVersion { .. }
        )
    }
}

impl From<BackendError> for crate::Error {
    fn from(err: BackendError) -> Self {
        crate::Error::Backend(err)
    }
}
