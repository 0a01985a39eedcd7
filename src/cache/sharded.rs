//! Sharded Cache Module
//!
//! Spreads keys over a fixed set of independent [`AdvancedCache`] shards so
//! that unrelated keys do not contend on one lock.

use std::future::Future;

use serde::Serialize;

use crate::cache::size::SizeEstimator;
use crate::cache::{AdvancedCache, CacheEntry, CacheOptions, CacheStats, DEFAULT_SEGMENT_COUNT};
use crate::error::Result;

// == Key Hash ==
/// 32-bit rolling hash over the key's UTF-16 code units.
///
/// `hash = (hash << 5) - hash + unit`, wrapping at 32 bits. Key placement
/// depends on this exact formula.
pub fn hash32(key: &str) -> i32 {
    key.encode_utf16().fold(0i32, |hash, unit| {
        (hash << 5).wrapping_sub(hash).wrapping_add(unit as i32)
    })
}

// == Sharded Cache ==
/// A cache partitioned into N shards by key hash.
///
/// Each shard holds `ceil(bound / N)` of every configured budget. Key
/// ownership never changes for the lifetime of the cache.
pub struct ShardedCache<T> {
    shards: Vec<AdvancedCache<T>>,
}

impl<T> Clone for ShardedCache<T> {
    fn clone(&self) -> Self {
        Self {
            shards: self.shards.clone(),
        }
    }
}

impl<T> std::fmt::Debug for ShardedCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedCache")
            .field("segments", &self.shards.len())
            .finish_non_exhaustive()
    }
}

impl<T> ShardedCache<T>
where
    T: Serialize + Clone + Send + 'static,
{
    // == Constructor ==
    /// Builds `options.segment_count` shards (4 when unset) sized by JSON
    /// representation.
    pub fn new(options: CacheOptions) -> Result<Self> {
        options.validate()?;
        let segments = options.segment_count.unwrap_or(DEFAULT_SEGMENT_COUNT);
        let per_shard = options.per_shard(segments);
        let shards = (0..segments)
            .map(|_| AdvancedCache::new(per_shard.clone()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { shards })
    }
}

impl<T> ShardedCache<T>
where
    T: Clone + Send + 'static,
{
    /// Builds shards that share a custom size estimator.
    pub fn with_estimator<E>(options: CacheOptions, estimator: E) -> Result<Self>
    where
        E: SizeEstimator<T> + Clone + 'static,
    {
        options.validate()?;
        let segments = options.segment_count.unwrap_or(DEFAULT_SEGMENT_COUNT);
        let per_shard = options.per_shard(segments);
        let shards = (0..segments)
            .map(|_| AdvancedCache::with_estimator(per_shard.clone(), estimator.clone()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { shards })
    }

    pub fn segment_count(&self) -> usize {
        self.shards.len()
    }

    // == Routing ==
    /// Index of the shard owning `key`.
    pub fn shard_index(&self, key: &str) -> usize {
        hash32(key).unsigned_abs() as usize % self.shards.len()
    }

    /// The shard owning `key`.
    pub fn shard_for(&self, key: &str) -> &AdvancedCache<T> {
        &self.shards[self.shard_index(key)]
    }

    pub fn shards(&self) -> &[AdvancedCache<T>] {
        &self.shards
    }

    pub fn set(&self, key: impl Into<String>, value: T) -> CacheEntry<T> {
        let key = key.into();
        self.shard_for(&key).set(key, value)
    }

    pub fn get(&self, key: &str) -> Option<T> {
        self.shard_for(key).get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.shard_for(key).has(key)
    }

    pub fn delete(&self, key: &str) -> bool {
        self.shard_for(key).delete(key)
    }

    /// See [`AdvancedCache::get_with_revalidation`].
    pub fn get_with_revalidation<F, Fut>(&self, key: &str, revalidate: F) -> Option<T>
    where
        F: FnOnce(String, T) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        self.shard_for(key).get_with_revalidation(key, revalidate)
    }

    /// Clears every shard.
    pub fn clear(&self) {
        for shard in &self.shards {
            shard.clear();
        }
    }

    pub fn reset_stats(&self) {
        for shard in &self.shards {
            shard.reset_stats();
        }
    }

    pub fn purge_expired(&self) -> usize {
        self.shards.iter().map(AdvancedCache::purge_expired).sum()
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(AdvancedCache::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(AdvancedCache::is_empty)
    }

    // == Stats ==
    /// Aggregated statistics with a `shard-<i>` breakdown.
    pub fn stats(&self) -> CacheStats {
        CacheStats::aggregate(self.shards.iter().map(AdvancedCache::stats).collect())
    }
}
