//! # Depot Core
//!
//! A single-node deduplicating content-addressed file store.
//!
//! Uploaded blobs are addressed by their BLAKE3 digest: identical bytes are
//! stored exactly once on disk, while a JSON-snapshotted metadata index maps
//! each digest to its display name, size, upload time, and media type.
//! Per-file and store-wide quotas are enforced before any write, and every
//! mutation persists the index synchronously so metadata always matches the
//! on-disk blob set after a successful operation.
//!
//! ## Features
//!
//! - Content-addressed storage with write-once, deduplicated blobs
//! - Metadata index with recency-ordered listing and name search
//! - Quota enforcement (per-file and aggregate ceilings)
//! - Crash-tolerant startup: a corrupt index snapshot degrades to an empty store
//! - Integrity checking by re-hashing stored objects
//!
//! ## Example
//!
//! ```no_run
//! use depot_core::{StorageEngine, StoreConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Open (or create) a store
//! let engine = StorageEngine::open(StoreConfig::new("./depot-store"))?;
//!
//! // Upload some bytes; identical content is stored only once
//! let outcome = engine.upload(b"hello world", "greeting.txt")?;
//! println!("stored as {}", outcome.digest);
//!
//! // Fetch them back by digest
//! let content = engine.download(&outcome.digest)?;
//! assert_eq!(content.bytes, b"hello world");
//!
//! // Inspect usage
//! let report = engine.stats();
//! println!("{} files, {} bytes", report.stats.total_files, report.stats.total_bytes);
//! # Ok(())
//! # }
//! ```

mod blobs;
mod engine;
mod error;
mod hash;
mod index;
mod quota;
mod record;

pub use blobs::BlobStore;
pub use engine::{
    DEFAULT_MAX_OBJECT_BYTES, DEFAULT_MAX_TOTAL_BYTES, FileContent, Listing, SNAPSHOT_FILE,
    StorageEngine, StoreConfig, UploadOutcome, UsageReport,
};
pub use error::{Error, Result};
pub use hash::{DIGEST_SIZE, Digest};
pub use index::Index;
pub use quota::QuotaGuard;
pub use record::{FileRecord, StoreStats, media_type_for};
