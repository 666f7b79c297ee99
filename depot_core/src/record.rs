//! File metadata records and aggregate usage statistics.

use crate::hash::Digest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata for one distinct stored object.
///
/// Keyed by `digest`; `display_name` is not part of the identity, so
/// re-uploading identical bytes under a new name refreshes the name and
/// timestamp without touching the stored content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub digest: Digest,
    pub display_name: String,
    pub size_bytes: u64,
    pub upload_time: DateTime<Utc>,
    pub media_type: String,
}

impl FileRecord {
    /// Build a record for an upload happening now, inferring the media type
    /// from the display name's extension.
    pub fn new(digest: Digest, display_name: impl Into<String>, size_bytes: u64) -> Self {
        let display_name = display_name.into();
        let media_type = media_type_for(&display_name);
        FileRecord {
            digest,
            display_name,
            size_bytes,
            upload_time: Utc::now(),
            media_type,
        }
    }
}

/// Infer a media type from a filename extension.
///
/// Unrecognized extensions fall back to `application/octet-stream`.
pub fn media_type_for(display_name: &str) -> String {
    mime_guess::from_path(display_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Aggregate usage over the whole index.
///
/// Maintained incrementally on every insert and delete, never recomputed
/// lazily, so drift from the true aggregate is a bug.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_files: u64,
    pub total_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_known_extensions() {
        assert_eq!(media_type_for("report.pdf"), "application/pdf");
        assert_eq!(media_type_for("notes.txt"), "text/plain");
        assert_eq!(media_type_for("photo.png"), "image/png");
    }

    #[test]
    fn test_media_type_unknown_defaults_to_octet_stream() {
        assert_eq!(media_type_for("archive.xyzzy"), "application/octet-stream");
        assert_eq!(media_type_for("no_extension"), "application/octet-stream");
    }

    #[test]
    fn test_record_captures_media_type() {
        let digest = Digest::of_bytes(b"content");
        let record = FileRecord::new(digest, "invoice.pdf", 7);

        assert_eq!(record.digest, digest);
        assert_eq!(record.display_name, "invoice.pdf");
        assert_eq!(record.size_bytes, 7);
        assert_eq!(record.media_type, "application/pdf");
    }

    #[test]
    fn test_record_serde_roundtrip() {
        let record = FileRecord::new(Digest::of_bytes(b"x"), "x.txt", 1);
        let json = serde_json::to_string(&record).unwrap();
        let back: FileRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
