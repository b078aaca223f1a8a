//! Store Module
//!
//! Byte-level backing store contract and an in-memory reference backend.
//!
//! Everything above this layer speaks logical keys and JSON values; everything
//! below it speaks `(cache name, key bytes) -> value bytes` with a TTL.

mod entry;
mod memory;
mod stats;

use std::fmt;
use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt};

use crate::error::{CacheError, Result};

pub use entry::{current_timestamp_ms, StoredEntry};
pub use memory::InMemoryCacheWriter;
pub use stats::{CacheStatistics, StatsCounter};

/// Message used when a writer cannot serve future-based retrieval.
pub const ASYNC_RETRIEVE_UNSUPPORTED: &str =
    "The configured cache writer does not support future-based retrieval";

// == Cache Writer ==
/// Raw byte-level operations against the backing store.
///
/// A TTL of [`Duration::ZERO`] means the entry never expires. Atomicity of
/// [`put_if_absent`](CacheWriter::put_if_absent) is whatever the store
/// guarantees per entry; callers add no locking of their own.
pub trait CacheWriter: Send + Sync + fmt::Debug {
    /// Fetches the bytes stored under `key`, if present and not expired.
    fn get(&self, name: &str, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Fetches `key` and refreshes its expiry to `ttl` (time-to-idle).
    ///
    /// Stores without idle expiry fall back to a plain read.
    fn get_with_ttl(&self, name: &str, key: &[u8], ttl: Duration) -> Result<Option<Vec<u8>>> {
        let _ = ttl;
        self.get(name, key)
    }

    /// Writes `value` under `key`, replacing any existing entry.
    fn put(&self, name: &str, key: &[u8], value: &[u8], ttl: Duration) -> Result<()>;

    /// Writes `value` only if `key` is absent; returns the existing bytes otherwise.
    fn put_if_absent(
        &self,
        name: &str,
        key: &[u8],
        value: &[u8],
        ttl: Duration,
    ) -> Result<Option<Vec<u8>>>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove(&self, name: &str, key: &[u8]) -> Result<()>;

    /// Removes every key of cache `name` matching the glob `pattern`.
    fn clean(&self, name: &str, pattern: &[u8]) -> Result<()>;

    /// Whether [`retrieve`](CacheWriter::retrieve) and [`store`](CacheWriter::store) work.
    fn supports_async_retrieve(&self) -> bool {
        false
    }

    /// Future-based variant of [`get`](CacheWriter::get) and
    /// [`get_with_ttl`](CacheWriter::get_with_ttl).
    fn retrieve(
        &self,
        name: &str,
        key: Vec<u8>,
        idle_ttl: Option<Duration>,
    ) -> BoxFuture<'static, Result<Option<Vec<u8>>>> {
        let _ = (name, key, idle_ttl);
        future::ready(Err(CacheError::UnsupportedCapability(
            ASYNC_RETRIEVE_UNSUPPORTED.to_string(),
        )))
        .boxed()
    }

    /// Future-based variant of [`put`](CacheWriter::put).
    fn store(
        &self,
        name: &str,
        key: Vec<u8>,
        value: Vec<u8>,
        ttl: Duration,
    ) -> BoxFuture<'static, Result<()>> {
        let _ = (name, key, value, ttl);
        future::ready(Err(CacheError::UnsupportedCapability(
            ASYNC_RETRIEVE_UNSUPPORTED.to_string(),
        )))
        .boxed()
    }

    /// Statistics accumulated for cache `name`.
    fn statistics(&self, name: &str) -> CacheStatistics {
        CacheStatistics::empty(name)
    }

    /// Resets the statistics of cache `name`.
    fn clear_statistics(&self, name: &str) {
        let _ = name;
    }
}

// == Glob Matching ==
/// Matches `key` against a glob where `*` stands for any run of bytes.
pub fn glob_matches(pattern: &[u8], key: &[u8]) -> bool {
    let (mut p, mut k) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while k < key.len() {
        if p < pattern.len() && pattern[p] == b'*' {
            backtrack = Some((p, k));
            p += 1;
        } else if p < pattern.len() && pattern[p] == key[k] {
            p += 1;
            k += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            k = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&b| b == b'*')
}
