//! In-memory metadata index with a persisted JSON snapshot.

use crate::error::{Error, Result};
use crate::hash::Digest;
use crate::record::{FileRecord, StoreStats};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tracing::{debug, warn};

/// The mapping `digest -> FileRecord` plus aggregate stats.
///
/// Owned exclusively by the storage engine; persisted whole to a JSON
/// snapshot after every mutation. The snapshot schema is:
///
/// ```json
/// {
///   "files": { "<digest hex>": { ...record fields... } },
///   "stats": { "total_files": 1, "total_bytes": 5 }
/// }
/// ```
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Index {
    files: HashMap<Digest, FileRecord>,
    stats: StoreStats,
}

impl Index {
    /// Load the index from a snapshot file.
    ///
    /// An absent, unreadable, or unparsable snapshot degrades to an empty
    /// index with zeroed stats; this never fails.
    pub fn load(path: &Path) -> Index {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no index snapshot, starting empty");
                return Index::default();
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "unreadable index snapshot, starting empty");
                return Index::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(index) => index,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "corrupt index snapshot, starting empty");
                Index::default()
            }
        }
    }

    /// Serialize the full index and atomically replace the snapshot file.
    ///
    /// Writes to a temp file in the snapshot's directory and persists over
    /// the target, so a concurrent reader never observes a partial snapshot
    /// and a failed save leaves the prior snapshot intact.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = path
            .parent()
            .ok_or_else(|| Error::invalid_argument("snapshot path has no parent directory"))?;

        let payload = serde_json::to_vec_pretty(self)
            .map_err(|e| Error::Io {
                source: std::io::Error::other(e),
            })?;

        let mut temp_file = tempfile::NamedTempFile::new_in(dir)?;
        temp_file.write_all(&payload)?;
        temp_file.flush()?;
        temp_file.persist(path)?;

        Ok(())
    }

    /// Look up a record by digest.
    pub fn get(&self, digest: &Digest) -> Option<&FileRecord> {
        self.files.get(digest)
    }

    /// Insert or replace a record, returning the prior record if any.
    ///
    /// Stats are not touched here; the caller adjusts them (a replacement
    /// under the same digest has the same size by construction, so only a
    /// fresh insert moves the aggregates).
    pub fn put(&mut self, record: FileRecord) -> Option<FileRecord> {
        self.files.insert(record.digest, record)
    }

    /// Remove a record, returning it so the caller can decrement stats.
    pub fn remove(&mut self, digest: &Digest) -> Option<FileRecord> {
        self.files.remove(digest)
    }

    /// Current aggregate stats.
    pub fn stats(&self) -> StoreStats {
        self.stats
    }

    /// Number of distinct records.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the index holds no records.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over all records in unspecified order.
    pub fn records(&self) -> impl Iterator<Item = &FileRecord> {
        self.files.values()
    }

    /// Account for a freshly inserted record of `size_bytes`.
    pub(crate) fn note_insert(&mut self, size_bytes: u64) {
        self.stats.total_files += 1;
        self.stats.total_bytes += size_bytes;
    }

    /// Account for a removed record of `size_bytes`.
    pub(crate) fn note_remove(&mut self, size_bytes: u64) {
        self.stats.total_files = self.stats.total_files.saturating_sub(1);
        self.stats.total_bytes = self.stats.total_bytes.saturating_sub(size_bytes);
    }

    /// Page through records ordered by `upload_time` descending, ties broken
    /// by ascending digest for determinism.
    ///
    /// Returns the page and the unpaginated record count. A zero `limit` or
    /// an `offset` past the end yields an empty page.
    pub fn list_ordered(&self, limit: usize, offset: usize) -> (Vec<FileRecord>, u64) {
        let mut records: Vec<&FileRecord> = self.files.values().collect();
        records.sort_by_key(|r| (Reverse(r.upload_time), r.digest));

        let page = records
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        (page, self.files.len() as u64)
    }

    /// Case-insensitive substring search over display names.
    ///
    /// An empty query matches everything. The result is sorted by digest so
    /// identical inputs always produce identical output.
    pub fn search_by_name(&self, query: &str) -> Vec<FileRecord> {
        let needle = query.to_lowercase();
        let mut matches: Vec<FileRecord> = self
            .files
            .values()
            .filter(|r| r.display_name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        matches.sort_by_key(|r| r.digest);
        matches
    }
}
