//! Cache Entry Module
//!
//! Defines the value-plus-metadata record stored for each key.

use std::time::{SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// A single cache entry with value and bookkeeping metadata.
///
/// `expires_at` is fixed when the entry is written; reads never extend it.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    /// The stored value
    pub value: T,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
    /// Estimated size of `value`, computed at write time
    pub approx_size_bytes: usize,
    /// Last successful read or write (Unix milliseconds)
    pub last_accessed_at: u64,
    /// Number of successful reads served from this entry
    pub hit_count: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new entry that expires `ttl_ms` from now.
    pub fn new(value: T, ttl_ms: u64, approx_size_bytes: usize) -> Self {
        let now = current_timestamp_ms();
        Self {
            value,
            expires_at: now.saturating_add(ttl_ms),
            approx_size_bytes,
            last_accessed_at: now,
            hit_count: 0,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches `expires_at`.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Same as [`is_expired`](Self::is_expired) against a caller-supplied clock reading.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    // == Touch ==
    /// Records a successful read.
    pub fn touch(&mut self) {
        self.hit_count += 1;
        self.last_accessed_at = current_timestamp_ms();
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
///
/// A clock set before the epoch reads as 0.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
