//! Namespace resolution, legacy migration, and stale namespace purging.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{Namespace, SessionContext, classify};
use crate::backend::Storage;
use crate::constants::{USER_EMAIL, USER_PROFILE};
use crate::events::AuthSignal;
use crate::profile::UserProfile;

/// Outcome of [`NamespaceManager::refresh`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceRefresh {
    /// Namespace active after the refresh
    pub namespace: Option<Namespace>,
    /// Whether the active namespace changed
    pub changed: bool,
    /// Number of keys deleted from other namespaces
    pub purged: usize,
    /// Number of legacy keys copied into the active namespace
    pub migrated: usize,
}

/// Keeps the active namespace in step with the stored identity.
///
/// The manager talks to the raw store directly; it is the only component that
/// sees physical keys of every namespace. All storage failures are logged and
/// absorbed: a failed read counts as "absent", a failed write as "not done".
#[derive(Clone)]
pub struct NamespaceManager {
    raw: Arc<dyn Storage>,
    context: Arc<SessionContext>,
}

impl NamespaceManager {
    /// Creates a manager over `raw` sharing `context`.
    pub fn new(raw: Arc<dyn Storage>, context: Arc<SessionContext>) -> Self {
        Self { raw, context }
    }

    /// The shared session context.
    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    /// The active namespace.
    pub fn current(&self) -> Option<Namespace> {
        self.context.current()
    }

    /// Derives the namespace from the stored identity.
    ///
    /// The profile blob's email wins; a missing or malformed blob falls through
    /// to the raw email key. Returns `None` when neither yields an identifier.
    pub fn resolve_namespace(&self) -> Option<Namespace> {
        let from_profile = self
            .read(USER_PROFILE)
            .and_then(|raw| UserProfile::parse(&raw))
            .and_then(|profile| profile.identifier().and_then(Namespace::for_identifier));

        let resolved =
            from_profile.or_else(|| self.read(USER_EMAIL).and_then(|e| Namespace::for_identifier(&e)));
        debug!(namespace = ?resolved.as_ref().map(Namespace::as_str), "Resolved namespace");
        resolved
    }

    /// Copies un-namespaced per-user keys into `namespace`.
    ///
    /// Runs at most once per activation of `namespace` and only while it is the
    /// active namespace; later calls return 0 without touching the store. An
    /// existing namespaced value is never overwritten. The legacy keys are left
    /// in place.
    ///
    /// Returns the number of keys copied.
    pub fn migrate_legacy_keys(&self, namespace: &Namespace) -> usize {
        if !self.context.begin_migration(namespace) {
            debug!(namespace = %namespace, "Migration already done or namespace inactive");
            return 0;
        }

        let mut migrated = 0;
        for key in self.raw_keys() {
            if Namespace::is_namespaced_key(&key) || !classify(&key).is_namespaced() {
                continue;
            }
            let target = namespace.qualify(&key);
            match self.raw.get_item(&target) {
                Ok(None) => {}
                Ok(Some(_)) => continue,
                Err(e) => {
                    warn!("Skipping migration of '{key}': {e}");
                    continue;
                }
            }
            let Some(value) = self.read(&key) else {
                continue;
            };
            match self.raw.set_item(&target, &value) {
                Ok(()) => migrated += 1,
                Err(e) => warn!("Failed to migrate '{key}' into {namespace}: {e}"),
            }
        }

        if migrated > 0 {
            info!(namespace = %namespace, migrated, "Migrated legacy keys");
        }
        migrated
    }

    /// Deletes every namespaced key that does not belong to `active`.
    ///
    /// With `active == None` every namespaced key is deleted. Un-namespaced keys
    /// are never touched. Returns the number of keys deleted.
    pub fn purge_stale_namespaces(&self, active: Option<&Namespace>) -> usize {
        let mut stale = BTreeSet::new();
        let mut purged = 0;

        for key in self.raw_keys() {
            let Some((namespace, _)) = Namespace::parse(&key) else {
                continue;
            };
            if active.is_some_and(|a| a.owns(&key)) {
                continue;
            }
            match self.raw.remove_item(&key) {
                Ok(()) => {
                    stale.insert(namespace);
                    purged += 1;
                }
                Err(e) => warn!("Failed to purge '{key}': {e}"),
            }
        }

        if purged > 0 {
            info!(purged, namespaces = stale.len(), "Purged stale namespaces");
        }
        purged
    }

    /// Re-resolves the namespace, then purges and migrates.
    ///
    /// Purge always runs before migration, and both complete before this
    /// returns. Migration is skipped if it already ran for this activation.
    pub fn refresh(&self) -> NamespaceRefresh {
        let namespace = self.resolve_namespace();
        let changed = self.context.activate(namespace.clone());
        let purged = self.purge_stale_namespaces(namespace.as_ref());
        let migrated = namespace
            .as_ref()
            .map(|ns| self.migrate_legacy_keys(ns))
            .unwrap_or(0);

        NamespaceRefresh {
            namespace,
            changed,
            purged,
            migrated,
        }
    }

    /// Refreshes if the stored identity no longer matches the active namespace.
    ///
    /// Catches a user switch made by another writer while liveness stayed up.
    pub fn refresh_if_stale(&self) -> Option<NamespaceRefresh> {
        let resolved = self.resolve_namespace();
        (resolved != self.current()).then(|| self.refresh())
    }

    /// Refreshes if `signal` can change who is signed in.
    pub fn handle_signal(&self, signal: &AuthSignal) -> Option<NamespaceRefresh> {
        signal.affects_identity().then(|| self.refresh())
    }

    fn read(&self, key: &str) -> Option<String> {
        self.raw.get_item(key).unwrap_or_else(|e| {
            warn!("Failed to read '{key}': {e}");
            None
        })
    }

    fn raw_keys(&self) -> Vec<String> {
        self.raw.keys().unwrap_or_else(|e| {
            warn!("Failed to enumerate keys: {e}");
            Vec::new()
        })
    }
}
