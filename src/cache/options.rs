//! Cache Options Module
//!
//! Construction options shared by single and sharded caches.

use serde::Deserialize;

use crate::error::{CacheError, Result};

/// Default number of shards for a sharded cache.
pub const DEFAULT_SEGMENT_COUNT: usize = 4;

// == Cache Options ==
/// Options consumed when constructing a cache.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheOptions {
    /// Time to live in milliseconds, fixed at write time
    #[serde(rename = "ttl")]
    pub ttl_ms: u64,
    /// Maximum number of entries
    #[serde(default)]
    pub max_size: Option<usize>,
    /// Maximum sum of estimated entry sizes in bytes
    #[serde(default)]
    pub max_memory_usage: Option<usize>,
    /// Serve expired values while refreshing them in the background
    #[serde(default)]
    pub stale_while_revalidate: bool,
    /// Number of shards; values above 1 select the sharded cache
    #[serde(default)]
    pub segment_count: Option<usize>,
}

impl CacheOptions {
    // == Constructor ==
    /// Creates options with the given TTL and no budgets.
    pub fn new(ttl_ms: u64) -> Self {
        Self {
            ttl_ms,
            max_size: None,
            max_memory_usage: None,
            stale_while_revalidate: false,
            segment_count: None,
        }
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    pub fn with_max_memory_usage(mut self, bytes: usize) -> Self {
        self.max_memory_usage = Some(bytes);
        self
    }

    pub fn with_stale_while_revalidate(mut self, enabled: bool) -> Self {
        self.stale_while_revalidate = enabled;
        self
    }

    pub fn with_segment_count(mut self, segment_count: usize) -> Self {
        self.segment_count = Some(segment_count);
        self
    }

    // == Validate ==
    /// Rejects options no cache can be built from.
    pub fn validate(&self) -> Result<()> {
        if self.ttl_ms == 0 {
            return Err(CacheError::Configuration(
                "ttl must be a positive number of milliseconds".to_string(),
            ));
        }
        if self.segment_count == Some(0) {
            return Err(CacheError::Configuration(
                "segmentCount must be at least 1".to_string(),
            ));
        }
        if self.max_size == Some(0) {
            return Err(CacheError::Configuration(
                "maxSize must be positive when set".to_string(),
            ));
        }
        if self.max_memory_usage == Some(0) {
            return Err(CacheError::Configuration(
                "maxMemoryUsage must be positive when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether these options select the sharded cache.
    pub fn is_sharded(&self) -> bool {
        self.segment_count.unwrap_or(1) > 1
    }

    // == Per Shard ==
    /// Options for one of `segments` shards: bounds divided, rounded up.
    pub fn per_shard(&self, segments: usize) -> Self {
        Self {
            ttl_ms: self.ttl_ms,
            max_size: self.max_size.map(|n| n.div_ceil(segments)),
            max_memory_usage: self.max_memory_usage.map(|n| n.div_ceil(segments)),
            stale_while_revalidate: self.stale_while_revalidate,
            segment_count: None,
        }
    }
}
