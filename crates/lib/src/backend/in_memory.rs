//! In-memory storage backend
//!
//! An ordered map behind a `RwLock`, suitable for tests, for short-lived
//! processes, and as the working copy of a snapshot loaded from disk.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::errors::BackendError;
use super::{Storage, persistence};
use crate::Result;

/// A simple in-memory store using a `BTreeMap`.
///
/// Keys enumerate in lexicographic order, so [`Storage::key`] is stable between
/// calls as long as the key set does not change.
///
/// An optional quota bounds the total size (key bytes plus value bytes) the
/// store accepts, mirroring the per-origin quota of browser storage. Writes that
/// would exceed it fail with [`BackendError::QuotaExceeded`].
#[derive(Debug, Default)]
pub struct InMemory {
    items: RwLock<BTreeMap<String, String>>,
    quota: Option<usize>,
}

impl InMemory {
    /// Creates a new, empty store without a quota.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new, empty store that accepts at most `bytes` of data.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            items: RwLock::new(BTreeMap::new()),
            quota: Some(bytes),
        }
    }

    /// Creates a store pre-populated with `items`.
    pub fn from_items<I, K, V>(items: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            items: RwLock::new(
                items
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            quota: None,
        }
    }

    /// Loads a store from a JSON snapshot. A missing file yields an empty store.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let items = persistence::read_snapshot(path.as_ref())?;
        Ok(Self {
            items: RwLock::new(items),
            quota: None,
        })
    }

    /// Saves the current contents as a JSON snapshot.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let items = self.read()?;
        persistence::write_snapshot(path.as_ref(), &items)
    }

    /// Returns a copy of every stored pair.
    pub fn snapshot(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.read()?.clone())
    }

    /// Total bytes currently used (keys plus values).
    pub fn used_bytes(&self) -> Result<usize> {
        Ok(usage(&*self.read()?))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, String>>> {
        self.items
            .read()
            .map_err(|_| BackendError::LockPoisoned.into())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, String>>> {
        self.items
            .write()
            .map_err(|_| BackendError::LockPoisoned.into())
    }
}

fn usage(items: &BTreeMap<String, String>) -> usize {
    items.iter().map(|(k, v)| k.len() + v.len()).sum()
}

impl Storage for InMemory {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.write()?;
        if let Some(limit) = self.quota {
            let replaced = items.get(key).map(|old| key.len() + old.len()).unwrap_or(0);
            let projected = usage(&items) - replaced + key.len() + value.len();
            if projected > limit {
                return Err(BackendError::QuotaExceeded {
                    key: key.to_string(),
                    limit,
                }
                .into());
            }
        }
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.write()?.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.write()?.clear();
        Ok(())
    }

    fn key(&self, index: usize) -> Result<Option<String>> {
        Ok(self.read()?.keys().nth(index).cloned())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.read()?.keys().cloned().collect())
    }
}
