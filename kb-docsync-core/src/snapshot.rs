//! The snapshot file handed from the Path Lister to the Document Registrar.
//!
//! One JSON document, replaced wholesale on every listing run:
//!
//! ```json
//! { "version": 1, "date": 1729267200000, "valid_path_list": [ ... ] }
//! ```
//!
//! Writes go through a temporary file in the target directory that is then
//! persisted over the old snapshot, so readers see either the previous file or
//! the complete new one.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::error::SyncError;

pub const SNAPSHOT_VERSION: u32 = 1;

fn legacy_version() -> u32 {
    1
}

/// One documentation file found in the repository tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEntry {
    pub path: String,
    pub name: String,
    pub web_url: String,
    pub is_new_current_run: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default = "legacy_version")]
    pub version: u32,
    /// Generation time, Unix epoch milliseconds.
    pub date: i64,
    pub valid_path_list: Vec<PathEntry>,
}

impl Snapshot {
    pub fn new(valid_path_list: Vec<PathEntry>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            date: chrono::Utc::now().timestamp_millis(),
            valid_path_list,
        }
    }

    /// Entries not yet present in the knowledge base when the snapshot was taken.
    pub fn new_entries(&self) -> Vec<PathEntry> {
        self.valid_path_list
            .iter()
            .filter(|entry| entry.is_new_current_run)
            .cloned()
            .collect()
    }

    pub fn new_entry_count(&self) -> usize {
        self.valid_path_list
            .iter()
            .filter(|entry| entry.is_new_current_run)
            .count()
    }
}

pub fn read_snapshot(path: &Path) -> Result<Snapshot, SyncError> {
    let content = fs::read_to_string(path)?;
    let snapshot: Snapshot = serde_json::from_str(&content)?;
    if snapshot.version > SNAPSHOT_VERSION {
        return Err(SyncError::UnsupportedSnapshotVersion {
            found: snapshot.version,
            supported: SNAPSHOT_VERSION,
        });
    }
    debug!(
        path = %path.display(),
        date = snapshot.date,
        entries = snapshot.valid_path_list.len(),
        "Read snapshot"
    );
    Ok(snapshot)
}

pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), SyncError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !dir.exists() {
        fs::create_dir_all(dir)?;
        debug!(path = %dir.display(), "Created snapshot directory");
    }

    let json = serde_json::to_vec(snapshot)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&json)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;

    info!(
        path = %path.display(),
        date = snapshot.date,
        entries = snapshot.valid_path_list.len(),
        "Wrote snapshot"
    );
    Ok(())
}
