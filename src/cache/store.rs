//! Cache Store Module
//!
//! Single-instance cache engine combining HashMap storage with LRU tracking,
//! TTL expiration, optional entry and memory budgets, and stale-while-revalidate
//! refreshes.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::cache::entry::current_timestamp_ms;
use crate::cache::size::{estimate_or_zero, JsonSizeEstimator, SizeEstimator};
use crate::cache::{CacheEntry, CacheOptions, CacheStats, LruTracker, StatsCounters};
use crate::error::{CacheError, Result};

/// Completion handle for a background revalidation.
pub type RevalidationFuture = Shared<BoxFuture<'static, ()>>;

struct InFlight {
    id: u64,
    done: RevalidationFuture,
}

// == Cache State ==
/// Everything guarded by the cache lock.
struct CacheState<T> {
    entries: HashMap<String, CacheEntry<T>>,
    lru: LruTracker,
    stats: StatsCounters,
    memory_usage: usize,
    in_flight: HashMap<String, InFlight>,
    next_refresh_id: u64,
}

impl<T> CacheState<T> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: StatsCounters::new(),
            memory_usage: 0,
            in_flight: HashMap::new(),
            next_refresh_id: 0,
        }
    }

    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry<T>> {
        let entry = self.entries.remove(key)?;
        self.lru.remove(key);
        self.memory_usage = self.memory_usage.saturating_sub(entry.approx_size_bytes);
        Some(entry)
    }

    fn evict_oldest(&mut self) -> bool {
        let Some(key) = self.lru.evict_oldest() else {
            return false;
        };
        if let Some(entry) = self.entries.remove(&key) {
            self.memory_usage = self.memory_usage.saturating_sub(entry.approx_size_bytes);
        }
        self.stats.record_eviction();
        debug!(key = %key, "evicted least recently used entry");
        true
    }

    fn purge_expired(&mut self, now_ms: u64) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now_ms))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove_entry(key);
        }
        expired.len()
    }

    fn release_in_flight(&mut self, key: &str, id: u64) {
        if self.in_flight.get(key).map(|f| f.id) == Some(id) {
            self.in_flight.remove(key);
        }
    }
}

struct Inner<T> {
    options: CacheOptions,
    estimator: Box<dyn SizeEstimator<T>>,
    state: Mutex<CacheState<T>>,
}

// == Advanced Cache ==
/// Single-instance cache with TTL expiry, strict LRU eviction and statistics.
///
/// Cloning is cheap and yields a handle to the same cache.
pub struct AdvancedCache<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for AdvancedCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for AdvancedCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdvancedCache")
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

impl<T> AdvancedCache<T>
where
    T: Serialize + Clone + Send + 'static,
{
    // == Constructor ==
    /// Creates a cache that sizes values by their JSON representation.
    pub fn new(options: CacheOptions) -> Result<Self> {
        Self::with_estimator(options, JsonSizeEstimator)
    }
}

impl<T> AdvancedCache<T>
where
    T: Clone + Send + 'static,
{
    /// Creates a cache with a custom size estimator.
    pub fn with_estimator(
        options: CacheOptions,
        estimator: impl SizeEstimator<T> + 'static,
    ) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            inner: Arc::new(Inner {
                options,
                estimator: Box::new(estimator),
                state: Mutex::new(CacheState::new()),
            }),
        })
    }

    pub fn options(&self) -> &CacheOptions {
        &self.inner.options
    }

    // == Set ==
    /// Stores a value, replacing any previous entry for the key.
    ///
    /// The TTL restarts from now. Least recently used entries are evicted
    /// until the configured budgets admit the new entry. A value larger than
    /// the whole memory budget is not retained.
    pub fn set(&self, key: impl Into<String>, value: T) -> CacheEntry<T> {
        let key = key.into();
        let size = estimate_or_zero(self.inner.estimator.as_ref(), &key, &value);
        let mut guard = self.inner.state.lock();
        self.insert(&mut guard, key, value, size)
    }

    fn insert(
        &self,
        state: &mut CacheState<T>,
        key: String,
        value: T,
        size: usize,
    ) -> CacheEntry<T> {
        let options = &self.inner.options;
        let now = current_timestamp_ms();

        let mut entry = CacheEntry::new(value, options.ttl_ms, size);
        if let Some(previous) = state.remove_entry(&key) {
            if !previous.is_expired_at(now) {
                entry.hit_count = previous.hit_count;
            }
        }

        if let Some(max_memory) = options.max_memory_usage {
            if size > max_memory {
                warn!(
                    key = %key,
                    size,
                    max_memory,
                    "value exceeds the cache memory budget, not retained"
                );
                return entry;
            }
            if state.memory_usage + size > max_memory {
                state.purge_expired(now);
            }
            while state.memory_usage + size > max_memory && state.evict_oldest() {}
        }

        if let Some(max_size) = options.max_size {
            if state.entries.len() >= max_size {
                state.purge_expired(now);
            }
            while state.entries.len() >= max_size && state.evict_oldest() {}
        }

        state.memory_usage += size;
        state.lru.touch(&key);
        state.entries.insert(key, entry.clone());
        entry
    }

    // == Get ==
    /// Retrieves a live value, refreshing its recency.
    ///
    /// Expired entries are removed and counted as misses.
    pub fn get(&self, key: &str) -> Option<T> {
        let started = Instant::now();
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;
        let now = current_timestamp_ms();

        match state.entries.get_mut(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                entry.touch();
                let value = entry.value.clone();
                state.lru.touch(key);
                state.stats.record_hit(elapsed_ms(started));
                Some(value)
            }
            Some(_) => {
                state.remove_entry(key);
                state.stats.record_miss();
                None
            }
            None => {
                state.stats.record_miss();
                None
            }
        }
    }

    // == Has ==
    /// Checks for a live entry without counting a hit or miss or changing recency.
    ///
    /// An expired entry found here is removed.
    pub fn has(&self, key: &str) -> bool {
        let mut state = self.inner.state.lock();
        let expired = match state.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => return false,
        };
        if expired {
            state.remove_entry(key);
        }
        !expired
    }

    // == Delete ==
    /// Removes an entry. Returns whether anything was removed.
    pub fn delete(&self, key: &str) -> bool {
        self.inner.state.lock().remove_entry(key).is_some()
    }

    // == Clear ==
    /// Drops every entry and forgets in-flight revalidations.
    ///
    /// Refreshes already running are not cancelled. A successful one still
    /// writes its value back through the normal insert path.
    pub fn clear(&self) {
        let mut state = self.inner.state.lock();
        state.entries.clear();
        state.lru.clear();
        state.memory_usage = 0;
        state.in_flight.clear();
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let state = self.inner.state.lock();
        CacheStats {
            hits: state.stats.hits,
            misses: state.stats.misses,
            size: state.entries.len(),
            max_size: self.inner.options.max_size,
            evictions: state.stats.evictions,
            memory_usage: state.memory_usage,
            max_memory_usage: self.inner.options.max_memory_usage,
            average_access_time: state.stats.average_access_time(),
            hit_rate: CacheStats::hit_rate(state.stats.hits, state.stats.misses),
            segment_stats: None,
        }
    }

    /// Zeroes hit, miss, eviction and latency counters. Entries are untouched.
    pub fn reset_stats(&self) {
        self.inner.state.lock().stats.reset();
    }

    // == Cleanup Expired ==
    /// Removes all expired entries. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        self.inner
            .state
            .lock()
            .purge_expired(current_timestamp_ms())
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys from least to most recently used.
    pub fn keys(&self) -> Vec<String> {
        self.inner
            .state
            .lock()
            .lru
            .iter()
            .map(str::to_string)
            .collect()
    }

    /// Snapshot of an entry, expired or not, without touching it.
    pub fn peek_entry(&self, key: &str) -> Option<CacheEntry<T>> {
        self.inner.state.lock().entries.get(key).cloned()
    }

    // == Get With Revalidation ==
    /// Stale-while-revalidate read.
    ///
    /// Fresh entries behave exactly like [`get`](Self::get). When the entry
    /// has expired and stale serving is enabled, the stale value is returned
    /// at once and, unless one is already running for this key, a single
    /// background call to `revalidate` is started. A successful refresh
    /// replaces the entry through [`set`](Self::set); a failed one is logged
    /// and leaves the stale entry in place.
    ///
    /// Never waits on the refresh. Outside a tokio runtime no refresh is
    /// started.
    pub fn get_with_revalidation<F, Fut>(&self, key: &str, revalidate: F) -> Option<T>
    where
        F: FnOnce(String, T) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let started = Instant::now();
        let mut guard = self.inner.state.lock();
        let state = &mut *guard;
        let now = current_timestamp_ms();

        let entry = match state.entries.get_mut(key) {
            Some(entry) => entry,
            None => {
                state.stats.record_miss();
                return None;
            }
        };

        if !entry.is_expired_at(now) {
            entry.touch();
            let value = entry.value.clone();
            state.lru.touch(key);
            state.stats.record_hit(elapsed_ms(started));
            return Some(value);
        }

        if !self.inner.options.stale_while_revalidate {
            state.remove_entry(key);
            state.stats.record_miss();
            return None;
        }

        entry.touch();
        let stale = entry.value.clone();
        state.lru.touch(key);
        state.stats.record_hit(elapsed_ms(started));

        if !state.in_flight.contains_key(key) {
            self.spawn_revalidation(state, key, stale.clone(), revalidate);
        }
        Some(stale)
    }

    fn spawn_revalidation<F, Fut>(
        &self,
        state: &mut CacheState<T>,
        key: &str,
        stale: T,
        revalidate: F,
    ) where
        F: FnOnce(String, T) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let runtime = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(key, "no async runtime available, skipping background revalidation");
                return;
            }
        };

        let id = state.next_refresh_id;
        state.next_refresh_id += 1;
        let cache = self.clone();
        let owned_key = key.to_string();

        let refresh = async move {
            let call_key = owned_key.clone();
            // The call itself may panic before a future exists
            let outcome = AssertUnwindSafe(async move { revalidate(call_key, stale).await })
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(anyhow::anyhow!("revalidation callback panicked")));
            cache.finish_revalidation(&owned_key, id, outcome);
        }
        .boxed()
        .shared();

        state.in_flight.insert(
            key.to_string(),
            InFlight {
                id,
                done: refresh.clone(),
            },
        );
        runtime.spawn(refresh);
        debug!(key, "started background revalidation");
    }

    fn finish_revalidation(&self, key: &str, id: u64, outcome: anyhow::Result<T>) {
        match outcome {
            Ok(value) => {
                let size = estimate_or_zero(self.inner.estimator.as_ref(), key, &value);
                let mut guard = self.inner.state.lock();
                self.insert(&mut guard, key.to_string(), value, size);
                guard.release_in_flight(key, id);
                debug!(key, "background revalidation refreshed entry");
            }
            Err(e) => {
                let err = CacheError::revalidation(key, &e);
                warn!(error = %err, "background revalidation failed, keeping stale entry");
                self.inner.state.lock().release_in_flight(key, id);
            }
        }
    }

    /// Resolves once the in-flight revalidation for `key` has settled.
    pub fn pending_revalidation(&self, key: &str) -> Option<RevalidationFuture> {
        self.inner
            .state
            .lock()
            .in_flight
            .get(key)
            .map(|f| f.done.clone())
    }

    pub fn in_flight_revalidations(&self) -> usize {
        self.inner.state.lock().in_flight.len()
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
