//!
//! ScopeKV: per-user namespacing and session liveness over a shared key-value store.
//!
//! Several users may take turns on one device, and they all share one store.
//! This crate keeps each user's data apart and tells the application when a
//! session begins or ends.
//!
//! ## Core Concepts
//!
//! * **Storage (`backend::Storage`)**: The raw key-value contract (get/set/remove/clear/key/len).
//!   `backend::InMemory` and `backend::JsonFile` implement it.
//! * **Namespaces (`namespace::Namespace`)**: The `user:<identifier>:` prefix derived from the
//!   signed-in user's email. Keys are classified (`namespace::classify`) to decide which ones
//!   receive the prefix; authentication keys never do.
//! * **NamespaceManager (`namespace::NamespaceManager`)**: Resolves the active namespace, purges
//!   other users' data and migrates legacy keys forward, in that order, on every identity change.
//! * **NamespacedStorage (`storage::NamespacedStorage`)**: A `Storage` wrapper that translates
//!   logical keys to physical ones, so application code never sees the prefix.
//! * **SessionMonitor (`monitor::SessionMonitor`)**: An edge-triggered state machine that infers
//!   login and logout from the session keys, enforces the idle timeout and debounces auth errors
//!   from the networking layer. `monitor::SessionWatcher` drives it from a tokio task.
//! * **Events (`events::SessionEvent`)**: `login`, `manual-logout`, `system-logout` and
//!   `auth-error` notifications broadcast on an `events::EventBus`.
//! * **SessionRuntime (`runtime::SessionRuntime`)**: Wires all of the above together once at
//!   startup.

pub mod auth;
pub mod backend;
pub mod clock;
pub mod config;
pub mod constants;
#[cfg(any(debug_assertions, feature = "testing"))]
pub mod debug;
pub mod events;
pub mod monitor;
pub mod namespace;
pub mod profile;
pub mod runtime;
pub mod storage;

pub use backend::{InMemory, JsonFile, Storage};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use events::{AuthSignal, EventBus, SessionEvent};
pub use namespace::{KeyClass, Namespace, classify};
pub use runtime::SessionRuntime;
pub use storage::NamespacedStorage;

/// Result type used throughout the ScopeKV library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the ScopeKV library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured storage errors from the backend module
    #[error(transparent)]
    Backend(backend::BackendError),

    /// Structured watcher errors from the monitor module
    #[error(transparent)]
    Monitor(monitor::MonitorError),

    /// Structured configuration errors from the config module
    #[error(transparent)]
    Config(config::ConfigError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Backend(_) => "backend",
            Error::Monitor(_) => "monitor",
            Error::Config(_) => "config",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error is storage-related.
    pub fn is_storage_error(&self) -> bool {
        matches!(self, Error::Backend(_))
    }

    /// Check if a write was refused because the store is full.
    pub fn is_quota_exceeded(&self) -> bool {
        match self {
            Error::Backend(backend_err) => backend_err.is_quota_exceeded(),
            _ => false,
        }
    }

    /// Check if this error indicates a data integrity issue.
    pub fn is_integrity_error(&self) -> bool {
        match self {
            Error::Backend(backend_err) => backend_err.is_integrity_error(),
            Error::Serialize(_) => true,
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Backend(backend_err) => backend_err.is_io_error(),
            Error::Config(config::ConfigError::Read { .. }) => true,
            _ => false,
        }
    }

    /// Check if this error comes from the session watcher.
    pub fn is_monitor_error(&self) -> bool {
        matches!(self, Error::Monitor(_))
    }

    /// Check if this error is configuration-related.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}
