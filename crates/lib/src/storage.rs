//! Namespaced storage
//!
//! [`NamespacedStorage`] is the store the rest of the application uses. It
//! implements [`Storage`] over a raw backend and translates every logical key
//! through the active namespace, so call sites written against plain keys
//! (`"favorites"`, `"cart"`) transparently read and write the current user's
//! copy while system keys (`"auth_token"`) stay global.
//!
//! Every operation is infallible from the caller's point of view: backend
//! failures are logged and degrade to "not found" / "not stored".

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::Result;
use crate::backend::Storage;
use crate::namespace::{Namespace, NamespaceManager, SessionContext, to_physical_key};

/// The namespacing adapter over a raw store.
pub struct NamespacedStorage {
    raw: Arc<dyn Storage>,
    manager: NamespaceManager,
}

impl NamespacedStorage {
    /// Wraps `raw` and performs the initial purge and migration.
    pub fn new(raw: Arc<dyn Storage>, context: Arc<SessionContext>) -> Self {
        let manager = NamespaceManager::new(raw.clone(), context);
        let refresh = manager.refresh();
        debug!(
            namespace = ?refresh.namespace.as_ref().map(Namespace::as_str),
            purged = refresh.purged,
            migrated = refresh.migrated,
            "Installed namespaced storage"
        );
        Self { raw, manager }
    }

    /// The namespace manager driving key translation.
    pub fn manager(&self) -> &NamespaceManager {
        &self.manager
    }

    /// The underlying raw store.
    pub fn raw(&self) -> &Arc<dyn Storage> {
        &self.raw
    }

    /// The active namespace.
    pub fn namespace(&self) -> Option<Namespace> {
        self.manager.current()
    }

    /// Logical keys stored under the active namespace, in enumeration order.
    ///
    /// Empty when no namespace is active.
    pub fn get_user_keys(&self) -> Vec<String> {
        match self.namespace() {
            Some(ns) => self.keys_in(&ns),
            None => Vec::new(),
        }
    }

    /// Every logical key/value pair of the active namespace.
    ///
    /// Values that parse as JSON are exported as JSON, anything else as a
    /// string. Empty when no namespace is active.
    pub fn export_user_data(&self) -> Map<String, Value> {
        let mut out = Map::new();
        for key in self.get_user_keys() {
            if let Some(raw) = self.read(&key) {
                let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
                out.insert(key, value);
            }
        }
        out
    }

    /// Writes each entry of `data` through the namespaced path.
    ///
    /// String values are stored verbatim, other values as JSON. Does nothing
    /// when no namespace is active. Returns the number of entries written.
    pub fn import_user_data(&self, data: &Map<String, Value>) -> usize {
        let Some(ns) = self.namespace() else {
            warn!("Refusing to import user data without an active namespace");
            return 0;
        };
        let mut written = 0;
        for (key, value) in data {
            let encoded = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let physical = to_physical_key(key, Some(&ns));
            match self.raw.set_item(&physical, &encoded) {
                Ok(()) => written += 1,
                Err(e) => warn!("Failed to import '{key}': {e}"),
            }
        }
        written
    }

    fn keys_in(&self, ns: &Namespace) -> Vec<String> {
        self.raw_keys()
            .iter()
            .filter_map(|k| ns.strip(k))
            .map(str::to_string)
            .collect()
    }

    fn raw_keys(&self) -> Vec<String> {
        self.raw.keys().unwrap_or_else(|e| {
            warn!("Failed to enumerate keys: {e}");
            Vec::new()
        })
    }

    fn read(&self, key: &str) -> Option<String> {
        let ns = self.namespace();
        let physical = to_physical_key(key, ns.as_ref());
        self.raw.get_item(&physical).unwrap_or_else(|e| {
            warn!("Failed to read '{physical}': {e}");
            None
        })
    }
}

impl Storage for NamespacedStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let ns = self.namespace();
        let physical = to_physical_key(key, ns.as_ref());
        if let Err(e) = self.raw.set_item(&physical, value) {
            warn!("Value for '{physical}' not stored: {e}");
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let ns = self.namespace();
        let physical = to_physical_key(key, ns.as_ref());
        if let Err(e) = self.raw.remove_item(&physical) {
            warn!("Failed to remove '{physical}': {e}");
        }
        Ok(())
    }

    /// Clears the active namespace only; without a namespace clears everything.
    fn clear(&self) -> Result<()> {
        match self.namespace() {
            Some(ns) => {
                for key in self.raw_keys().into_iter().filter(|k| ns.owns(k)) {
                    if let Err(e) = self.raw.remove_item(&key) {
                        warn!("Failed to remove '{key}': {e}");
                    }
                }
            }
            None => {
                if let Err(e) = self.raw.clear() {
                    warn!("Failed to clear storage: {e}");
                }
            }
        }
        Ok(())
    }

    /// With a namespace active, indexes the namespace's own logical keys.
    fn key(&self, index: usize) -> Result<Option<String>> {
        match self.namespace() {
            Some(ns) => Ok(self.keys_in(&ns).into_iter().nth(index)),
            None => Ok(self.raw.key(index).unwrap_or_else(|e| {
                warn!("Failed to read key {index}: {e}");
                None
            })),
        }
    }

    fn len(&self) -> Result<usize> {
        match self.namespace() {
            Some(ns) => Ok(self.keys_in(&ns).len()),
            None => Ok(self.raw.len().unwrap_or_else(|e| {
                warn!("Failed to count keys: {e}");
                0
            })),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        match self.namespace() {
            Some(ns) => Ok(self.keys_in(&ns)),
            None => Ok(self.raw_keys()),
        }
    }
}
