//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStats;

/// Response body for GET /caches/:name/entries/:key
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub cache: String,
    pub key: String,
    pub value: Value,
}

impl GetResponse {
    pub fn new(cache: impl Into<String>, key: impl Into<String>, value: Value) -> Self {
        Self {
            cache: cache.into(),
            key: key.into(),
            value,
        }
    }
}

/// Response body for PUT /caches/:name/entries
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    pub key: String,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
    /// Estimated entry size in bytes
    pub size_bytes: usize,
}

impl SetResponse {
    pub fn new(key: impl Into<String>, expires_at: u64, size_bytes: usize) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
            expires_at,
            size_bytes,
        }
    }
}

/// Response body for DELETE /caches/:name/entries/:key
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub key: String,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for DELETE /caches and DELETE /caches/:name
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
    pub cleared: Vec<String>,
}

impl ClearResponse {
    pub fn new(cleared: Vec<String>) -> Self {
        Self {
            message: format!("Cleared {} cache(s)", cleared.len()),
            cleared,
        }
    }
}

/// One entry of the cache listing.
#[derive(Debug, Clone, Serialize)]
pub struct CacheSummary {
    pub name: String,
    /// "single" or "sharded"
    pub kind: &'static str,
    pub stats: CacheStats,
}

/// Response body for GET /caches
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse {
    pub caches: Vec<CacheSummary>,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
