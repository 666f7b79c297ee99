//! Content digests using BLAKE3.

use crate::error::{Error, Result};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::io::Read;

/// Digest size in bytes (BLAKE3 produces 256-bit hashes).
pub const DIGEST_SIZE: usize = 32;

/// A 32-byte BLAKE3 content digest.
///
/// Serves as both the identity of a stored file and its on-disk object name.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest([u8; DIGEST_SIZE]);

impl Digest {
    /// Create a Digest from raw bytes.
    pub fn from_bytes(bytes: [u8; DIGEST_SIZE]) -> Self {
        Digest(bytes)
    }

    /// Create a Digest from a hex string (64 hex characters).
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        if hex_str.len() != DIGEST_SIZE * 2 {
            return Err(Error::invalid_argument(format!(
                "Expected {} hex characters, got {}",
                DIGEST_SIZE * 2,
                hex_str.len()
            )));
        }

        let bytes = hex::decode(hex_str)
            .map_err(|e| Error::invalid_argument(format!("Invalid hex: {}", e)))?;

        let mut digest = [0u8; DIGEST_SIZE];
        digest.copy_from_slice(&bytes);
        Ok(Digest(digest))
    }

    /// Convert to hex string (64 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.0
    }

    /// Hash in-memory bytes using BLAKE3.
    pub fn of_bytes(data: &[u8]) -> Self {
        let hash = blake3::hash(data);
        Digest(*hash.as_bytes())
    }

    /// Hash data incrementally from a reader using BLAKE3.
    ///
    /// Same algorithm as [`Digest::of_bytes`]; used when re-hashing an
    /// on-disk object without loading it whole.
    pub fn of_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut hasher = blake3::Hasher::new();
        std::io::copy(&mut reader, &mut hasher)?;
        let hash = hasher.finalize();
        Ok(Digest(*hash.as_bytes()))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

// Digests serialize as hex strings so they can key JSON maps.

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Digest::from_hex(&s).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_empty() {
        let digest = Digest::of_bytes(b"");
        assert_eq!(digest.to_hex().len(), 64);
    }

    #[test]
    fn test_digest_hello_world() {
        let digest = Digest::of_bytes(b"hello world");
        let hex = digest.to_hex();
        assert_eq!(hex.len(), 64);

        // BLAKE3 of "hello world"
        assert_eq!(
            hex,
            "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24"
        );
    }

    #[test]
    fn test_digest_from_hex_roundtrip() {
        let original = Digest::of_bytes(b"test data");
        let hex = original.to_hex();
        let parsed = Digest::from_hex(&hex).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_digest_from_hex_invalid_length() {
        assert!(Digest::from_hex("abcd").is_err());
        assert!(Digest::from_hex("").is_err());
    }

    #[test]
    fn test_digest_from_hex_invalid_chars() {
        let invalid = "z".repeat(64);
        assert!(Digest::from_hex(&invalid).is_err());
    }

    #[test]
    fn test_of_reader_matches_of_bytes() {
        let data = b"streamed and buffered must agree";
        let from_bytes = Digest::of_bytes(data);
        let from_reader = Digest::of_reader(&data[..]).unwrap();
        assert_eq!(from_bytes, from_reader);
    }

    #[test]
    fn test_serde_hex_string() {
        let digest = Digest::of_bytes(b"serde");
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"{}\"", digest.to_hex()));

        let back: Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, digest);
    }

    #[test]
    fn test_digest_as_map_key() {
        use std::collections::HashMap;

        let digest = Digest::of_bytes(b"key");
        let mut map = HashMap::new();
        map.insert(digest, 1u32);

        let json = serde_json::to_string(&map).unwrap();
        let back: HashMap<Digest, u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get(&digest), Some(&1));
    }

    // Property-based tests
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            max_shrink_iters: 10000,
            ..ProptestConfig::default()
        })]

        /// Property 1: Digest determinism - hashing the same data always produces the same digest
        #[test]
        fn prop_digest_deterministic(data: Vec<u8>) {
            let d1 = Digest::of_bytes(&data);
            let d2 = Digest::of_bytes(&data);
            prop_assert_eq!(d1, d2);
        }

        /// Property 2: Hex encoding is bijective - round-trip through hex preserves the digest
        #[test]
        fn prop_hex_roundtrip(bytes in prop::array::uniform32(any::<u8>())) {
            let digest = Digest::from_bytes(bytes);
            let hex = digest.to_hex();
            let parsed = Digest::from_hex(&hex)?;
            prop_assert_eq!(digest, parsed);
        }

        /// Property 3: Streamed hashing agrees with buffered hashing
        #[test]
        fn prop_reader_matches_bytes(data: Vec<u8>) {
            let buffered = Digest::of_bytes(&data);
            let streamed = Digest::of_reader(&data[..])?;
            prop_assert_eq!(buffered, streamed);
        }

        /// Property 4: Invalid hex length always fails
        #[test]
        fn prop_invalid_hex_length_fails(
            s in "[0-9a-f]{0,63}|[0-9a-f]{65,128}"
        ) {
            prop_assert!(Digest::from_hex(&s).is_err());
        }
    }
}
