//! Snapshot persistence shared by the file-backed stores
//!
//! A snapshot is a small versioned JSON document:
//!
//! ```json
//! { "items": { "auth_token": "...", "user:a@x.com:cart": "[]" } }
//! ```

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::errors::BackendError;
use crate::Result;

/// The current snapshot format version.
/// v0 indicates this is an unstable format subject to breaking changes.
const SNAPSHOT_VERSION: u8 = 0;

fn is_v0(v: &u8) -> bool {
    *v == 0
}

#[derive(Serialize, Deserialize, Default)]
struct Snapshot {
    #[serde(rename = "_v", default, skip_serializing_if = "is_v0")]
    version: u8,
    #[serde(default)]
    items: BTreeMap<String, String>,
}

/// Read a snapshot from `path`. A missing file is an empty store.
pub(crate) fn read_snapshot(path: &Path) -> Result<BTreeMap<String, String>> {
    match std::fs::read_to_string(path) {
        Ok(json) if json.trim().is_empty() => Ok(BTreeMap::new()),
        Ok(json) => {
            let snapshot: Snapshot = serde_json::from_str(&json)
                .map_err(|source| BackendError::DeserializationFailed { source })?;
            if snapshot.version != SNAPSHOT_VERSION {
                return Err(BackendError::UnsupportedVersion {
                    version: snapshot.version,
                }
                .into());
            }
            Ok(snapshot.items)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(source) => Err(BackendError::FileIo { source }.into()),
    }
}

/// Write a snapshot to `path` atomically.
///
/// The JSON goes to a uniquely named temp file in the same directory, which is
/// then renamed over `path`. Readers see either the old or the new snapshot.
pub(crate) fn write_snapshot(path: &Path, items: &BTreeMap<String, String>) -> Result<()> {
    let snapshot = Snapshot {
        version: SNAPSHOT_VERSION,
        items: items.clone(),
    };
    let json = serde_json::to_vec_pretty(&snapshot)
        .map_err(|source| BackendError::SerializationFailed { source })?;

    let parent = parent_dir(path);
    std::fs::create_dir_all(parent).map_err(|source| BackendError::FileIo { source })?;

    let mut tmp =
        NamedTempFile::new_in(parent).map_err(|source| BackendError::FileIo { source })?;
    tmp.write_all(&json)
        .map_err(|source| BackendError::FileIo { source })?;
    tmp.persist(path)
        .map_err(|e| BackendError::FileIo { source: e.error })?;
    Ok(())
}

/// Directory holding `path`, `.` for a bare file name.
pub(crate) fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
}
