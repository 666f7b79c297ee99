//! Error types for depot_core.

use thiserror::Error;

/// Result type alias using depot_core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during depot operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Candidate object exceeds the per-file size ceiling.
    #[error("File too large: {size} bytes exceeds the per-file limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    /// Admitting the candidate would exceed the store-wide size ceiling.
    #[error(
        "Storage quota exceeded: {in_use} bytes in use, {requested} more requested, limit is {limit} bytes"
    )]
    QuotaExceeded {
        requested: u64,
        in_use: u64,
        limit: u64,
    },

    /// Digest or name not present in the index.
    #[error("Not found: {what}")]
    NotFound { what: String },

    /// The index references an object whose file is missing on disk.
    #[error("Object missing on disk: {digest}")]
    NotFoundOnDisk { digest: String },

    /// I/O failure during a blob or snapshot read/write.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Malformed caller input (bad digest hex, empty name, bad limits).
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },
}

impl Error {
    /// Create a TooLarge error.
    pub fn too_large(size: u64, limit: u64) -> Self {
        Error::TooLarge { size, limit }
    }

    /// Create a QuotaExceeded error.
    pub fn quota_exceeded(requested: u64, in_use: u64, limit: u64) -> Self {
        Error::QuotaExceeded {
            requested,
            in_use,
            limit,
        }
    }

    /// Create a NotFound error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound { what: what.into() }
    }

    /// Create a NotFoundOnDisk error.
    pub fn not_found_on_disk(digest: impl Into<String>) -> Self {
        Error::NotFoundOnDisk {
            digest: digest.into(),
        }
    }

    /// Create an InvalidArgument error.
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            reason: reason.into(),
        }
    }
}

// Additional From implementations for external error types

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io { source: err.error }
    }
}
