//! Pre-write admission checks against the configured size ceilings.

use crate::error::{Error, Result};

/// Enforces the per-file and store-wide size ceilings.
///
/// Pure check, no mutation; must be consulted before any blob write.
#[derive(Debug, Clone, Copy)]
pub struct QuotaGuard {
    max_object_bytes: u64,
    max_total_bytes: u64,
}

impl QuotaGuard {
    /// Create a guard. Both ceilings must be positive.
    pub fn new(max_object_bytes: u64, max_total_bytes: u64) -> Result<Self> {
        if max_object_bytes == 0 {
            return Err(Error::invalid_argument(
                "max_object_bytes must be positive",
            ));
        }
        if max_total_bytes == 0 {
            return Err(Error::invalid_argument("max_total_bytes must be positive"));
        }
        Ok(QuotaGuard {
            max_object_bytes,
            max_total_bytes,
        })
    }

    /// Per-file size ceiling in bytes.
    pub fn max_object_bytes(&self) -> u64 {
        self.max_object_bytes
    }

    /// Store-wide size ceiling in bytes.
    pub fn max_total_bytes(&self) -> u64 {
        self.max_total_bytes
    }

    /// Decide whether a candidate of `candidate_size` bytes may be written
    /// given `current_total_bytes` already in use.
    pub fn admit(&self, candidate_size: u64, current_total_bytes: u64) -> Result<()> {
        if candidate_size > self.max_object_bytes {
            return Err(Error::too_large(candidate_size, self.max_object_bytes));
        }
        match current_total_bytes.checked_add(candidate_size) {
            Some(total) if total <= self.max_total_bytes => Ok(()),
            // Arithmetic overflow counts as exceeding the ceiling
            _ => Err(Error::quota_exceeded(
                candidate_size,
                current_total_bytes,
                self.max_total_bytes,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_zero_ceilings() {
        assert!(QuotaGuard::new(0, 100).is_err());
        assert!(QuotaGuard::new(100, 0).is_err());
        assert!(QuotaGuard::new(1, 1).is_ok());
    }

    #[test]
    fn test_admit_within_limits() {
        let guard = QuotaGuard::new(10, 100).unwrap();
        assert!(guard.admit(10, 0).is_ok());
        assert!(guard.admit(5, 95).is_ok());
    }

    #[test]
    fn test_admit_rejects_oversized_object() {
        let guard = QuotaGuard::new(10, 100).unwrap();
        let err = guard.admit(11, 0).unwrap_err();
        assert!(matches!(err, Error::TooLarge { size: 11, limit: 10 }));
        // Message must state the limit
        assert!(err.to_string().contains("10"));
    }

    #[test]
    fn test_admit_rejects_aggregate_overflow() {
        let guard = QuotaGuard::new(10, 100).unwrap();
        let err = guard.admit(6, 95).unwrap_err();
        assert!(matches!(err, Error::QuotaExceeded { limit: 100, .. }));
        assert!(err.to_string().contains("100"));
    }

    #[test]
    fn test_admit_does_not_overflow() {
        let guard = QuotaGuard::new(u64::MAX, u64::MAX).unwrap();
        assert!(guard.admit(u64::MAX, u64::MAX).is_err());
    }
}
