//! Per-session namespace state.

use std::sync::{Mutex, MutexGuard};

use tracing::info;

use super::Namespace;

#[derive(Debug, Default)]
struct ContextState {
    namespace: Option<Namespace>,
    migrated: bool,
}

/// The active namespace and its migration flag.
///
/// A `SessionContext` is shared (via `Arc`) by the namespace manager, the
/// namespaced storage and the session watcher. Tests create one per case, so
/// contexts never leak between them.
#[derive(Debug, Default)]
pub struct SessionContext {
    state: Mutex<ContextState>,
}

impl SessionContext {
    /// Creates a context with no active namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// The active namespace, if any.
    pub fn current(&self) -> Option<Namespace> {
        self.lock().namespace.clone()
    }

    /// Makes `namespace` the active one.
    ///
    /// Returns true if this changed the active namespace, in which case the
    /// migration flag is reset. Re-activating the current namespace is a no-op.
    pub fn activate(&self, namespace: Option<Namespace>) -> bool {
        let mut state = self.lock();
        if state.namespace == namespace {
            return false;
        }
        match &namespace {
            Some(ns) => info!(namespace = %ns, "Activating namespace"),
            None => info!("Deactivating namespace"),
        }
        state.namespace = namespace;
        state.migrated = false;
        true
    }

    /// Drops the active namespace and the migration flag.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.namespace = None;
        state.migrated = false;
    }

    /// Whether legacy keys have been migrated for the active namespace.
    pub fn is_migrated(&self) -> bool {
        self.lock().migrated
    }

    /// Claims the migration for `namespace`.
    ///
    /// Returns true exactly once per activation of `namespace`; false if it is
    /// not the active namespace or the migration was already claimed.
    pub(crate) fn begin_migration(&self, namespace: &Namespace) -> bool {
        let mut state = self.lock();
        if state.migrated || state.namespace.as_ref() != Some(namespace) {
            return false;
        }
        state.migrated = true;
        true
    }

    fn lock(&self) -> MutexGuard<'_, ContextState> {
        // The state is two plain fields that are always left consistent, so a
        // poisoned lock is still safe to use.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
