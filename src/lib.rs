//! Memo Cache - capacity- and time-bounded memoization caches
//!
//! Provides a single-instance LRU/TTL cache, a sharded variant, a
//! stale-while-revalidate refresh protocol and a registry of named caches.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{
    AdvancedCache, CacheEntry, CacheOptions, CacheRegistry, CacheStats, NamedCache, ShardedCache,
};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_cleanup_task;
