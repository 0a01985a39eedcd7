//! Cache Registry Module
//!
//! Named, memoized cache instances with bulk operations for admin tooling.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{AdvancedCache, CacheEntry, CacheOptions, CacheStats, ShardedCache};
use crate::error::Result;

// == Named Cache ==
/// A registered cache of either kind.
pub enum NamedCache<T> {
    Single(AdvancedCache<T>),
    Sharded(ShardedCache<T>),
}

impl<T> Clone for NamedCache<T> {
    fn clone(&self) -> Self {
        match self {
            NamedCache::Single(cache) => NamedCache::Single(cache.clone()),
            NamedCache::Sharded(cache) => NamedCache::Sharded(cache.clone()),
        }
    }
}

impl<T> std::fmt::Debug for NamedCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NamedCache::Single(cache) => std::fmt::Debug::fmt(cache, f),
            NamedCache::Sharded(cache) => std::fmt::Debug::fmt(cache, f),
        }
    }
}

impl<T> NamedCache<T>
where
    T: Serialize + Clone + Send + 'static,
{
    /// Builds a sharded cache when `segment_count > 1`, else a single one.
    pub fn from_options(options: &CacheOptions) -> Result<Self> {
        if options.is_sharded() {
            Ok(NamedCache::Sharded(ShardedCache::new(options.clone())?))
        } else {
            Ok(NamedCache::Single(AdvancedCache::new(options.clone())?))
        }
    }
}

impl<T> NamedCache<T>
where
    T: Clone + Send + 'static,
{
    pub fn set(&self, key: impl Into<String>, value: T) -> CacheEntry<T> {
        match self {
            NamedCache::Single(cache) => cache.set(key, value),
            NamedCache::Sharded(cache) => cache.set(key, value),
        }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        match self {
            NamedCache::Single(cache) => cache.get(key),
            NamedCache::Sharded(cache) => cache.get(key),
        }
    }

    pub fn has(&self, key: &str) -> bool {
        match self {
            NamedCache::Single(cache) => cache.has(key),
            NamedCache::Sharded(cache) => cache.has(key),
        }
    }

    pub fn delete(&self, key: &str) -> bool {
        match self {
            NamedCache::Single(cache) => cache.delete(key),
            NamedCache::Sharded(cache) => cache.delete(key),
        }
    }

    pub fn get_with_revalidation<F, Fut>(&self, key: &str, revalidate: F) -> Option<T>
    where
        F: FnOnce(String, T) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        match self {
            NamedCache::Single(cache) => cache.get_with_revalidation(key, revalidate),
            NamedCache::Sharded(cache) => cache.get_with_revalidation(key, revalidate),
        }
    }

    pub fn clear(&self) {
        match self {
            NamedCache::Single(cache) => cache.clear(),
            NamedCache::Sharded(cache) => cache.clear(),
        }
    }

    pub fn reset_stats(&self) {
        match self {
            NamedCache::Single(cache) => cache.reset_stats(),
            NamedCache::Sharded(cache) => cache.reset_stats(),
        }
    }

    pub fn stats(&self) -> CacheStats {
        match self {
            NamedCache::Single(cache) => cache.stats(),
            NamedCache::Sharded(cache) => cache.stats(),
        }
    }

    pub fn purge_expired(&self) -> usize {
        match self {
            NamedCache::Single(cache) => cache.purge_expired(),
            NamedCache::Sharded(cache) => cache.purge_expired(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            NamedCache::Single(cache) => cache.len(),
            NamedCache::Sharded(cache) => cache.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether expired entries are served while being refreshed.
    pub fn serves_stale(&self) -> bool {
        match self {
            NamedCache::Single(cache) => cache.options().stale_while_revalidate,
            NamedCache::Sharded(cache) => cache
                .shards()
                .first()
                .is_some_and(|shard| shard.options().stale_while_revalidate),
        }
    }
}

struct Registered<T> {
    options: CacheOptions,
    cache: NamedCache<T>,
}

impl<T> Registered<T> {
    /// Hands out the registered cache, warning when `requested` differs.
    fn reuse(&self, name: &str, requested: &CacheOptions) -> NamedCache<T> {
        if self.options != *requested {
            warn!(name, "cache already registered with different options, keeping original");
        }
        self.cache.clone()
    }
}

// == Cache Registry ==
/// Name to cache map. The first registration of a name wins; entries are
/// never replaced.
pub struct CacheRegistry<T> {
    caches: RwLock<HashMap<String, Registered<T>>>,
}

impl<T> Default for CacheRegistry<T> {
    fn default() -> Self {
        Self {
            caches: RwLock::new(HashMap::new()),
        }
    }
}

impl<T> CacheRegistry<T>
where
    T: Serialize + Clone + Send + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    // == Get Or Create ==
    /// Returns the cache registered under `name`, building it on first use.
    ///
    /// Options passed for an already registered name are ignored.
    pub fn get_or_create(&self, name: &str, options: &CacheOptions) -> Result<NamedCache<T>> {
        if let Some(existing) = self.caches.read().get(name) {
            return Ok(existing.reuse(name, options));
        }

        let mut caches = self.caches.write();
        if let Some(existing) = caches.get(name) {
            return Ok(existing.reuse(name, options));
        }

        let cache = NamedCache::from_options(options)?;
        info!(
            name,
            ttl_ms = options.ttl_ms,
            sharded = options.is_sharded(),
            "registered cache"
        );
        caches.insert(
            name.to_string(),
            Registered {
                options: options.clone(),
                cache: cache.clone(),
            },
        );
        Ok(cache)
    }
}

impl<T> CacheRegistry<T>
where
    T: Clone + Send + 'static,
{
    pub fn get(&self, name: &str) -> Option<NamedCache<T>> {
        self.caches.read().get(name).map(|r| r.cache.clone())
    }

    /// Options the named cache was created with.
    pub fn options(&self, name: &str) -> Option<CacheOptions> {
        self.caches.read().get(name).map(|r| r.options.clone())
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn list_all(&self) -> BTreeMap<String, NamedCache<T>> {
        self.caches
            .read()
            .iter()
            .map(|(name, r)| (name.clone(), r.cache.clone()))
            .collect()
    }

    /// Clears one cache. Returns false if `name` is unknown.
    pub fn clear(&self, name: &str) -> bool {
        match self.get(name) {
            Some(cache) => {
                cache.clear();
                true
            }
            None => false,
        }
    }

    pub fn clear_all(&self) {
        for cache in self.list_all().values() {
            cache.clear();
        }
    }

    pub fn stats(&self, name: &str) -> Option<CacheStats> {
        self.get(name).map(|cache| cache.stats())
    }

    pub fn stats_all(&self) -> BTreeMap<String, CacheStats> {
        self.list_all()
            .into_iter()
            .map(|(name, cache)| (name, cache.stats()))
            .collect()
    }

    // == Cleanup Expired ==
    /// Sweeps expired entries from every cache that does not serve stale values.
    pub fn purge_expired_all(&self) -> usize {
        let mut removed = 0;
        for (name, cache) in self.list_all() {
            if cache.serves_stale() {
                continue;
            }
            let count = cache.purge_expired();
            if count > 0 {
                debug!(name = %name, count, "purged expired entries");
            }
            removed += count;
        }
        removed
    }
}
