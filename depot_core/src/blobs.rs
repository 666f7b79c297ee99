//! Write-once on-disk blob storage keyed by digest.

use crate::error::{Error, Result};
use crate::hash::Digest;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stores each object as a flat file named by its full digest hex.
///
/// Objects are write-once: a digest that already has a file on disk is never
/// rewritten, which is what makes upload idempotent at the storage layer.
#[derive(Debug)]
pub struct BlobStore {
    dir: PathBuf,
}

impl BlobStore {
    /// Create a blob store rooted at `dir`. The directory must already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        BlobStore { dir: dir.into() }
    }

    /// Path of the object file for a digest.
    pub fn object_path(&self, digest: &Digest) -> PathBuf {
        self.dir.join(digest.to_hex())
    }

    /// Whether an object file exists for this digest.
    pub fn exists(&self, digest: &Digest) -> bool {
        self.object_path(digest).exists()
    }

    /// Write an object unless it already exists.
    ///
    /// Returns whether a write occurred. Existing objects are left untouched;
    /// their content is identical by the addressing guarantee. New objects are
    /// written atomically via a temp file in the same directory.
    pub fn write_if_absent(&self, digest: &Digest, bytes: &[u8]) -> Result<bool> {
        let obj_path = self.object_path(digest);
        if obj_path.exists() {
            debug!(digest = %digest, "blob already present, skipping write");
            return Ok(false);
        }

        let mut temp_file = tempfile::NamedTempFile::new_in(&self.dir)?;
        temp_file.write_all(bytes)?;
        temp_file.flush()?;
        temp_file.persist(&obj_path)?;

        debug!(digest = %digest, size = bytes.len(), "stored blob");
        Ok(true)
    }

    /// Read an object's bytes.
    ///
    /// A missing object file is reported as `NotFoundOnDisk`; the engine
    /// decides what that divergence means per operation.
    pub fn read(&self, digest: &Digest) -> Result<Vec<u8>> {
        match fs::read(self.object_path(digest)) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(Error::not_found_on_disk(digest.to_hex()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Delete an object file.
    ///
    /// Returns `Ok(false)` when the file was already absent, which the caller
    /// treats as a repairable index/disk inconsistency rather than an error.
    pub fn delete(&self, digest: &Digest) -> Result<bool> {
        match fs::remove_file(self.object_path(digest)) {
            Ok(()) => {
                debug!(digest = %digest, "deleted blob");
                Ok(true)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Re-hash an object file and compare against its digest.
    ///
    /// Streams the file through the hasher rather than loading it whole.
    /// Returns `false` on mismatch (corruption); `NotFoundOnDisk` when the
    /// object file is missing.
    pub fn verify(&self, digest: &Digest) -> Result<bool> {
        let file = match fs::File::open(self.object_path(digest)) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(Error::not_found_on_disk(digest.to_hex()));
            }
            Err(err) => return Err(err.into()),
        };

        let actual = Digest::of_reader(file)?;
        Ok(actual == *digest)
    }

    /// Root directory of the blob store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, BlobStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = BlobStore::new(temp_dir.path());
        (temp_dir, store)
    }

    #[test]
    fn test_write_then_read() {
        let (_guard, store) = store();
        let data = b"hello blobs";
        let digest = Digest::of_bytes(data);

        assert!(store.write_if_absent(&digest, data).unwrap());
        assert!(store.exists(&digest));
        assert_eq!(store.read(&digest).unwrap(), data);
    }

    #[test]
    fn test_write_if_absent_is_write_once() {
        let (_guard, store) = store();
        let data = b"same content";
        let digest = Digest::of_bytes(data);

        assert!(store.write_if_absent(&digest, data).unwrap());
        assert!(!store.write_if_absent(&digest, data).unwrap());

        // Exactly one object file on disk
        let entries = fs::read_dir(store.dir()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_read_missing_is_not_found_on_disk() {
        let (_guard, store) = store();
        let digest = Digest::of_bytes(b"never written");

        let err = store.read(&digest).unwrap_err();
        assert!(matches!(err, Error::NotFoundOnDisk { .. }));
    }

    #[test]
    fn test_delete_absent_returns_false() {
        let (_guard, store) = store();
        let digest = Digest::of_bytes(b"ghost");

        assert!(!store.delete(&digest).unwrap());
    }

    #[test]
    fn test_delete_removes_object() {
        let (_guard, store) = store();
        let data = b"short lived";
        let digest = Digest::of_bytes(data);
        store.write_if_absent(&digest, data).unwrap();

        assert!(store.delete(&digest).unwrap());
        assert!(!store.exists(&digest));
    }

    #[test]
    fn test_verify_intact_object() {
        let (_guard, store) = store();
        let data = b"verify me";
        let digest = Digest::of_bytes(data);
        store.write_if_absent(&digest, data).unwrap();

        assert!(store.verify(&digest).unwrap());
    }

    #[test]
    fn test_verify_detects_corruption() {
        let (_guard, store) = store();
        let data = b"pristine bytes";
        let digest = Digest::of_bytes(data);
        store.write_if_absent(&digest, data).unwrap();

        // Flip one byte in the object file
        let path = store.object_path(&digest);
        let mut on_disk = fs::read(&path).unwrap();
        on_disk[0] ^= 0xFF;
        fs::write(&path, on_disk).unwrap();

        assert!(!store.verify(&digest).unwrap());
    }

    #[test]
    fn test_verify_missing_is_not_found_on_disk() {
        let (_guard, store) = store();
        let digest = Digest::of_bytes(b"missing");

        let err = store.verify(&digest).unwrap_err();
        assert!(matches!(err, Error::NotFoundOnDisk { .. }));
    }
}
