//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;

use crate::cache::CacheOptions;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default TTL in milliseconds for caches created through the API
    pub default_ttl_ms: u64,
    /// Maximum number of entries per cache
    pub max_entries: usize,
    /// Memory budget in bytes per cache, None = unbounded
    pub max_memory_bytes: Option<usize>,
    /// Shard count for caches created through the API
    pub segment_count: usize,
    /// Serve stale values while refreshing
    pub stale_while_revalidate: bool,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `MAX_ENTRIES` - Maximum entries per cache (default: 1000)
    /// - `MAX_MEMORY_BYTES` - Memory budget per cache (default: unbounded)
    /// - `SEGMENT_COUNT` - Shards per cache (default: 1)
    /// - `STALE_WHILE_REVALIDATE` - `true` to serve stale values (default: false)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_ttl_ms: env_or("DEFAULT_TTL_MS", defaults.default_ttl_ms),
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            max_memory_bytes: env::var("MAX_MEMORY_BYTES")
                .ok()
                .and_then(|v| v.parse().ok()),
            segment_count: env_or("SEGMENT_COUNT", defaults.segment_count),
            stale_while_revalidate: env_or(
                "STALE_WHILE_REVALIDATE",
                defaults.stale_while_revalidate,
            ),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
        }
    }

    /// Options for caches created on demand by the admin API.
    pub fn cache_options(&self) -> CacheOptions {
        let mut options = CacheOptions::new(self.default_ttl_ms)
            .with_max_size(self.max_entries)
            .with_stale_while_revalidate(self.stale_while_revalidate)
            .with_segment_count(self.segment_count);
        options.max_memory_usage = self.max_memory_bytes;
        options
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl_ms: 300_000,
            max_entries: 1000,
            max_memory_bytes: None,
            segment_count: 1,
            stale_while_revalidate: false,
            server_port: 3000,
            cleanup_interval: 1,
        }
    }
}
