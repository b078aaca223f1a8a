//! Threshold Policy
//!
//! Decides whether a serialized value is large enough to compress.

use serde::{Deserialize, Serialize};

// == Threshold ==
/// Minimum serialized length, in bytes, that triggers compression.
///
/// Fixed per wrapped cache manager; never re-evaluated per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Threshold(u64);

impl Threshold {
    /// Creates a threshold of `bytes`.
    pub const fn new(bytes: u64) -> Self {
        Self(bytes)
    }

    /// Returns the configured byte count.
    pub const fn bytes(&self) -> u64 {
        self.0
    }

    /// Inclusive: a value of exactly `bytes` length is compressed.
    pub fn should_compress(&self, serialized_len: usize) -> bool {
        should_compress(serialized_len, *self)
    }
}

impl From<u64> for Threshold {
    fn from(bytes: u64) -> Self {
        Self(bytes)
    }
}

/// Returns true when `serialized_len >= threshold`.
pub fn should_compress(serialized_len: usize, threshold: Threshold) -> bool {
    serialized_len as u64 >= threshold.0
}
