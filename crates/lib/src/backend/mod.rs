//! Raw key-value storage backends
//!
//! This module provides the [`Storage`] trait, the synchronous string-to-string
//! contract every store in this crate follows (the same shape as a browser's
//! `localStorage`), together with the concrete backends:
//!
//! * [`InMemory`]: an ordered in-process map with an optional byte quota.
//! * [`JsonFile`]: a JSON snapshot on disk, re-read on every operation so that
//!   several processes sharing the file observe each other's writes.
//!
//! The namespacing layer in [`crate::storage`] wraps any `Storage` and is itself
//! a `Storage`, so application code only ever depends on `Arc<dyn Storage>`.

use crate::Result;

pub mod errors;
mod in_memory;
mod json_file;
mod persistence;

pub use errors::BackendError;
pub use in_memory::InMemory;
pub use json_file::JsonFile;

/// Key-value storage contract.
///
/// All methods are synchronous. Implementations must be `Send` and `Sync` so a
/// store can be shared between the application and the session watcher task.
///
/// Missing keys are never an error: reads return `Ok(None)` and removals of
/// absent keys succeed.
pub trait Storage: Send + Sync {
    /// Reads the value stored under `key`.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key` if present.
    fn remove_item(&self, key: &str) -> Result<()>;

    /// Removes every key.
    fn clear(&self) -> Result<()>;

    /// Returns the key at `index` in the store's enumeration order.
    fn key(&self, index: usize) -> Result<Option<String>>;

    /// Returns the number of stored keys.
    fn len(&self) -> Result<usize>;

    /// Returns true if the store holds no keys.
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Returns every key in enumeration order.
    ///
    /// The default walks [`Storage::key`] up to [`Storage::len`]; backends that
    /// can produce a snapshot directly should override it.
    fn keys(&self) -> Result<Vec<String>> {
        let len = self.len()?;
        let mut keys = Vec::with_capacity(len);
        for index in 0..len {
            if let Some(key) = self.key(index)? {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    /// Returns true if `key` is present.
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get_item(key)?.is_some())
    }
}
