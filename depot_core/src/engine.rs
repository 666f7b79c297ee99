//! The storage engine: orchestrates hashing, quota checks, blob I/O, and the
//! metadata index, and owns the consistency contract between index and disk.

use crate::blobs::BlobStore;
use crate::error::{Error, Result};
use crate::hash::Digest;
use crate::index::Index;
use crate::quota::QuotaGuard;
use crate::record::{FileRecord, StoreStats};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;
use tracing::{debug, warn};

/// Name of the index snapshot file inside the storage directory.
///
/// Cannot collide with a blob name: blob names are exactly 64 hex characters.
pub const SNAPSHOT_FILE: &str = "index.json";

/// Default per-file ceiling: 32 GiB.
pub const DEFAULT_MAX_OBJECT_BYTES: u64 = 32 * 1024 * 1024 * 1024;

/// Default store-wide ceiling: 512 GiB.
pub const DEFAULT_MAX_TOTAL_BYTES: u64 = 512 * 1024 * 1024 * 1024;

/// Configuration for opening a [`StorageEngine`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding the blob objects and the index snapshot.
    pub root: PathBuf,
    /// Per-file size ceiling in bytes.
    pub max_object_bytes: u64,
    /// Store-wide size ceiling in bytes.
    pub max_total_bytes: u64,
}

impl StoreConfig {
    /// Configuration with the default ceilings.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        StoreConfig {
            root: root.into(),
            max_object_bytes: DEFAULT_MAX_OBJECT_BYTES,
            max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
        }
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub digest: Digest,
    pub record: FileRecord,
    /// Whether the bytes were already stored and only metadata was refreshed.
    pub deduplicated: bool,
}

/// An object's bytes with its presentation metadata.
#[derive(Debug, Clone)]
pub struct FileContent {
    pub bytes: Vec<u8>,
    pub display_name: String,
    pub media_type: String,
}

/// One page of records plus the unpaginated total, echoing the request.
#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub files: Vec<FileRecord>,
    pub total: u64,
    pub limit: usize,
    pub offset: usize,
}

/// Aggregate usage plus the configured ceilings.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct UsageReport {
    pub stats: StoreStats,
    pub max_object_bytes: u64,
    pub max_total_bytes: u64,
}

/// A single-node deduplicating content-addressed file store.
///
/// Mutating operations (upload, delete) serialize against each other and
/// against snapshot persistence behind a write lock; read-only operations
/// share a read lock and never observe a half-updated index.
#[derive(Debug)]
pub struct StorageEngine {
    blobs: BlobStore,
    quota: QuotaGuard,
    snapshot_path: PathBuf,
    index: RwLock<Index>,
}

impl StorageEngine {
    /// Open (or create) a store at `config.root`.
    ///
    /// Creates the storage directory if missing, validates the quota
    /// configuration, and loads the index snapshot. A corrupt or missing
    /// snapshot degrades to an empty store.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let quota = QuotaGuard::new(config.max_object_bytes, config.max_total_bytes)?;

        fs::create_dir_all(&config.root)?;

        let snapshot_path = config.root.join(SNAPSHOT_FILE);
        let index = Index::load(&snapshot_path);
        debug!(
            root = %config.root.display(),
            files = index.len(),
            "opened store"
        );

        Ok(StorageEngine {
            blobs: BlobStore::new(&config.root),
            quota,
            snapshot_path,
            index: RwLock::new(index),
        })
    }

    /// Store `bytes` under their content digest.
    ///
    /// The quota check runs once, before knowing whether the write will turn
    /// out to be a duplicate, using the worst-case size. A digest already in
    /// the index gets its display name, timestamp, and media type refreshed
    /// without touching the stored bytes or the aggregate stats. The index
    /// snapshot is persisted before the operation reports success; if that
    /// persist fails, the in-memory change is rolled back and the caller
    /// should retry.
    pub fn upload(&self, bytes: &[u8], display_name: &str) -> Result<UploadOutcome> {
        if display_name.is_empty() {
            return Err(Error::invalid_argument("display name must not be empty"));
        }

        let mut index = self.index.write().expect("index lock poisoned");

        let size = bytes.len() as u64;
        self.quota.admit(size, index.stats().total_bytes)?;

        let digest = Digest::of_bytes(bytes);
        let wrote = self.blobs.write_if_absent(&digest, bytes)?;

        let record = FileRecord::new(digest, display_name, size);
        let prior = index.put(record.clone());
        if prior.is_none() {
            index.note_insert(size);
        }

        if let Err(err) = index.save(&self.snapshot_path) {
            warn!(digest = %digest, error = %err, "snapshot save failed, rolling back upload");
            match prior {
                Some(previous) => {
                    index.put(previous);
                }
                None => {
                    index.remove(&digest);
                    index.note_remove(size);
                }
            }
            return Err(err);
        }

        debug!(
            digest = %digest,
            name = display_name,
            size,
            deduplicated = !wrote,
            "uploaded"
        );

        Ok(UploadOutcome {
            digest,
            record,
            deduplicated: !wrote,
        })
    }

    /// Fetch an object's bytes and presentation metadata.
    ///
    /// `NotFound` when the digest is unknown to the index; `NotFoundOnDisk`
    /// when the index has it but the object file is gone, which signals
    /// index/disk divergence.
    pub fn download(&self, digest: &Digest) -> Result<FileContent> {
        let index = self.index.read().expect("index lock poisoned");

        let record = index
            .get(digest)
            .ok_or_else(|| Error::not_found(digest.to_hex()))?;

        let bytes = self.blobs.read(digest).inspect_err(|err| {
            if matches!(err, Error::NotFoundOnDisk { .. }) {
                warn!(digest = %digest, "index entry has no object on disk");
            }
        })?;

        Ok(FileContent {
            bytes,
            display_name: record.display_name.clone(),
            media_type: record.media_type.clone(),
        })
    }

    /// Remove an object and its index entry, returning the removed record.
    ///
    /// Index/disk divergence resolves in favor of removing the stale index
    /// entry: the object file being already absent is logged, not an error.
    /// A failed unlink or snapshot save rolls the in-memory removal back so
    /// the mutation stays uncommitted.
    pub fn delete(&self, digest: &Digest) -> Result<FileRecord> {
        let mut index = self.index.write().expect("index lock poisoned");

        let Some(record) = index.remove(digest) else {
            return Err(Error::not_found(digest.to_hex()));
        };
        index.note_remove(record.size_bytes);

        let removed_on_disk = match self.blobs.delete(digest) {
            Ok(removed) => removed,
            Err(err) => {
                warn!(digest = %digest, error = %err, "blob delete failed, rolling back");
                index.note_insert(record.size_bytes);
                index.put(record);
                return Err(err);
            }
        };
        if !removed_on_disk {
            warn!(digest = %digest, "object was already absent on disk, removing stale index entry");
        }

        if let Err(err) = index.save(&self.snapshot_path) {
            warn!(digest = %digest, error = %err, "snapshot save failed, rolling back delete");
            index.note_insert(record.size_bytes);
            index.put(record);
            return Err(err);
        }

        debug!(digest = %digest, name = %record.display_name, "deleted");
        Ok(record)
    }

    /// Page through records, most recent upload first.
    pub fn list(&self, limit: usize, offset: usize) -> Listing {
        let index = self.index.read().expect("index lock poisoned");
        let (files, total) = index.list_ordered(limit, offset);
        Listing {
            files,
            total,
            limit,
            offset,
        }
    }

    /// Look up the record for a digest.
    pub fn info(&self, digest: &Digest) -> Result<FileRecord> {
        let index = self.index.read().expect("index lock poisoned");
        index
            .get(digest)
            .cloned()
            .ok_or_else(|| Error::not_found(digest.to_hex()))
    }

    /// Current aggregate usage and the configured ceilings.
    pub fn stats(&self) -> UsageReport {
        let index = self.index.read().expect("index lock poisoned");
        UsageReport {
            stats: index.stats(),
            max_object_bytes: self.quota.max_object_bytes(),
            max_total_bytes: self.quota.max_total_bytes(),
        }
    }

    /// Case-insensitive substring search over display names.
    pub fn search_by_name(&self, query: &str) -> Vec<FileRecord> {
        let index = self.index.read().expect("index lock poisoned");
        index.search_by_name(query)
    }

    /// Fetch the first record whose display name equals `name`, with bytes.
    ///
    /// Names are not unique, and the index iterates in unspecified order, so
    /// callers must not rely on which of several matches wins.
    pub fn find_by_exact_name(&self, name: &str) -> Result<FileContent> {
        let index = self.index.read().expect("index lock poisoned");

        let record = index
            .records()
            .find(|r| r.display_name == name)
            .ok_or_else(|| Error::not_found(name))?;

        let bytes = self.blobs.read(&record.digest)?;
        Ok(FileContent {
            bytes,
            display_name: record.display_name.clone(),
            media_type: record.media_type.clone(),
        })
    }

    /// Re-hash an object file and report whether it still matches its digest.
    ///
    /// `NotFound` when the digest is unknown to the index, `NotFoundOnDisk`
    /// when the object file is missing, otherwise whether the on-disk bytes
    /// are intact.
    pub fn verify(&self, digest: &Digest) -> Result<bool> {
        let index = self.index.read().expect("index lock poisoned");
        if index.get(digest).is_none() {
            return Err(Error::not_found(digest.to_hex()));
        }
        self.blobs.verify(digest)
    }
}
