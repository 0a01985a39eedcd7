//! Cache Module
//!
//! Memoization caches with TTL expiration, LRU eviction, optional memory
//! budgets, sharding and stale-while-revalidate refreshes.

mod entry;
mod lru;
mod options;
mod registry;
mod sharded;
mod size;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use lru::LruTracker;
pub use options::{CacheOptions, DEFAULT_SEGMENT_COUNT};
pub use registry::{CacheRegistry, NamedCache};
pub use sharded::{hash32, ShardedCache};
pub use size::{JsonSizeEstimator, SizeEstimator};
pub use stats::{CacheStats, StatsCounters, LATENCY_WINDOW};
pub use store::{AdvancedCache, RevalidationFuture};
