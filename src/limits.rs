// ABOUTME: Per-kind length limits checked before any length-proportional allocation.
// ABOUTME: Also carries the flag that enables strict map key ordering.

use crate::error::{Error, LimitKind, Result};
use crate::types::limits::DEFAULT_MAX_LENGTH;

/// Maximum declared lengths accepted by the decoder, plus map key-order validation.
///
/// Each limit is checked with a plain `length > max` test, so a length equal to the
/// maximum is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitPolicy {
    /// Maximum string length in bytes
    pub max_str_length: usize,
    /// Maximum binary length in bytes
    pub max_bin_length: usize,
    /// Maximum number of array elements
    pub max_array_length: usize,
    /// Maximum number of map entries
    pub max_map_length: usize,
    /// Maximum extension payload length in bytes
    pub max_ext_length: usize,
    /// Require map keys to be strictly increasing (rejects duplicates too)
    pub sorted_keys: bool,
}

impl Default for LimitPolicy {
    fn default() -> Self {
        Self {
            max_str_length: DEFAULT_MAX_LENGTH,
            max_bin_length: DEFAULT_MAX_LENGTH,
            max_array_length: DEFAULT_MAX_LENGTH,
            max_map_length: DEFAULT_MAX_LENGTH,
            max_ext_length: DEFAULT_MAX_LENGTH,
            sorted_keys: false,
        }
    }
}

impl LimitPolicy {
    /// The configured maximum for `kind`.
    #[must_use]
    pub const fn max(&self, kind: LimitKind) -> usize {
        match kind {
            LimitKind::Str => self.max_str_length,
            LimitKind::Bin => self.max_bin_length,
            LimitKind::Array => self.max_array_length,
            LimitKind::Map => self.max_map_length,
            LimitKind::Ext => self.max_ext_length,
        }
    }

    /// Fail with [`Error::LimitExceeded`] if `length` is over the maximum for `kind`.
    #[inline]
    pub fn check(&self, kind: LimitKind, length: usize) -> Result<()> {
        let max = self.max(kind);
        if length > max {
            return Err(Error::LimitExceeded { kind, length, max });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = LimitPolicy::default();
        assert_eq!(policy.max(LimitKind::Str), u32::MAX as usize);
        assert_eq!(policy.max(LimitKind::Ext), u32::MAX as usize);
        assert!(!policy.sorted_keys);
    }

    #[test]
    fn test_check_boundary() {
        let policy = LimitPolicy {
            max_bin_length: 4,
            ..LimitPolicy::default()
        };
        assert!(policy.check(LimitKind::Bin, 4).is_ok());
        assert_eq!(
            policy.check(LimitKind::Bin, 5),
            Err(Error::LimitExceeded {
                kind: LimitKind::Bin,
                length: 5,
                max: 4,
            })
        );
        // other kinds are independent
        assert!(policy.check(LimitKind::Str, 5).is_ok());
    }
}
