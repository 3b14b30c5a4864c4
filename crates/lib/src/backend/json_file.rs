//! File-backed storage backend

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::trace;

use super::errors::BackendError;
use super::{Storage, persistence};
use crate::Result;

/// A store persisted as a JSON snapshot.
///
/// Every operation re-reads the file and every mutation rewrites it atomically,
/// so there is no in-process cache to go stale: two processes pointing at the
/// same file see each other's writes on their next read, the way two browser
/// tabs share one profile's storage.
///
/// Mutations hold an exclusive advisory lock on a `<file>.lock` sibling for the
/// whole read-modify-write cycle, across threads and processes alike.
#[derive(Debug)]
pub struct JsonFile {
    path: PathBuf,
    lock_path: PathBuf,
}

impl JsonFile {
    /// Opens (without creating) the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut lock_path = path.as_os_str().to_owned();
        lock_path.push(".lock");
        Self {
            path,
            lock_path: PathBuf::from(lock_path),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        persistence::read_snapshot(&self.path)
    }

    /// Blocks until this handle holds the writer lock. Released on drop.
    fn lock(&self) -> Result<File> {
        let io = |source| BackendError::FileIo { source };
        std::fs::create_dir_all(persistence::parent_dir(&self.lock_path)).map_err(io)?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)
            .map_err(io)?;
        FileExt::lock_exclusive(&file).map_err(io)?;
        trace!(path = %self.lock_path.display(), "Acquired store lock");
        Ok(file)
    }

    fn modify<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let _lock = self.lock()?;
        let mut items = self.load()?;
        if f(&mut items) {
            persistence::write_snapshot(&self.path, &items)?;
        }
        Ok(())
    }
}

impl Storage for JsonFile {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.modify(|items| {
            items.insert(key.to_string(), value.to_string()).as_deref() != Some(value)
        })
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.modify(|items| items.remove(key).is_some())
    }

    fn clear(&self) -> Result<()> {
        self.modify(|items| {
            let changed = !items.is_empty();
            items.clear();
            changed
        })
    }

    fn key(&self, index: usize) -> Result<Option<String>> {
        Ok(self.load()?.into_keys().nth(index))
    }

    fn len(&self) -> Result<usize> {
        Ok(self.load()?.len())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.load()?.into_keys().collect())
    }
}
