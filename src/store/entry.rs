//! Stored Entry Module
//!
//! Defines the structure for individual stored values with TTL support.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

// == Stored Entry ==
/// A single value held by the in-memory writer.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    /// Envelope bytes exactly as written
    pub value: Vec<u8>,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl StoredEntry {
    // == Constructor ==
    /// Creates a new entry expiring after `ttl`.
    ///
    /// A zero TTL means the entry never expires.
    pub fn new(value: Vec<u8>, ttl: Duration) -> Self {
        let now = current_timestamp_ms();

        Self {
            value,
            created_at: now,
            expires_at: expiry_from(now, ttl),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches its expiration time.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => current_timestamp_ms() >= expires,
            None => false,
        }
    }

    // == Touch ==
    /// Restarts the expiry clock with `ttl` (time-to-idle reads).
    pub fn touch(&mut self, ttl: Duration) {
        self.expires_at = expiry_from(current_timestamp_ms(), ttl);
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    ///
    /// Returns `Some(0)` once the entry has expired.
    pub fn ttl_remaining_ms(&self) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(current_timestamp_ms()))
    }
}

// A non-zero TTL below one millisecond still lasts one millisecond.
fn expiry_from(now: u64, ttl: Duration) -> Option<u64> {
    if ttl.is_zero() {
        None
    } else {
        Some(now.saturating_add(ttl.as_millis().max(1) as u64))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
