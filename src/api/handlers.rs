//! API Handlers
//!
//! HTTP request handlers for the cache admin endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;

use crate::cache::{CacheOptions, CacheRegistry, CacheStats, NamedCache};
use crate::error::{CacheError, Result};
use crate::models::{
    CacheSummary, ClearResponse, DeleteResponse, GetResponse, HealthResponse, ListResponse,
    SetRequest, SetResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Named caches holding JSON values
    pub registry: Arc<CacheRegistry<Value>>,
    /// Options for caches created on first write
    pub defaults: CacheOptions,
}

impl AppState {
    /// Creates a new AppState around a registry.
    pub fn new(registry: Arc<CacheRegistry<Value>>, defaults: CacheOptions) -> Self {
        Self { registry, defaults }
    }

    /// Creates a new AppState with an empty registry from configuration.
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(Arc::new(CacheRegistry::new()), config.cache_options())
    }

    fn cache(&self, name: &str) -> Result<NamedCache<Value>> {
        self.registry
            .get(name)
            .ok_or_else(|| CacheError::NotFound(format!("cache '{}'", name)))
    }
}

/// Handler for PUT /caches/:name/entries
///
/// Stores a JSON value, creating the cache with default options if needed.
pub async fn set_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let cache = state.registry.get_or_create(&name, &state.defaults)?;
    let entry = cache.set(req.key.clone(), req.value);

    Ok(Json(SetResponse::new(
        req.key,
        entry.expires_at,
        entry.approx_size_bytes,
    )))
}

/// Handler for GET /caches/:name/entries/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path((name, key)): Path<(String, String)>,
) -> Result<Json<GetResponse>> {
    let value = state
        .cache(&name)?
        .get(&key)
        .ok_or_else(|| CacheError::NotFound(format!("key '{}'", key)))?;

    Ok(Json(GetResponse::new(name, key, value)))
}

/// Handler for DELETE /caches/:name/entries/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path((name, key)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>> {
    if !state.cache(&name)?.delete(&key) {
        return Err(CacheError::NotFound(format!("key '{}'", key)));
    }

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for GET /caches
///
/// Lists every registered cache with its statistics.
pub async fn list_handler(State(state): State<AppState>) -> Json<ListResponse> {
    let caches = state
        .registry
        .list_all()
        .into_iter()
        .map(|(name, cache)| CacheSummary {
            name,
            kind: match &cache {
                NamedCache::Single(_) => "single",
                NamedCache::Sharded(_) => "sharded",
            },
            stats: cache.stats(),
        })
        .collect();

    Json(ListResponse { caches })
}

/// Handler for GET /stats
pub async fn stats_handler(
    State(state): State<AppState>,
) -> Json<std::collections::BTreeMap<String, CacheStats>> {
    Json(state.registry.stats_all())
}

/// Handler for GET /caches/:name/stats
pub async fn cache_stats_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<CacheStats>> {
    state
        .registry
        .stats(&name)
        .map(Json)
        .ok_or_else(|| CacheError::NotFound(format!("cache '{}'", name)))
}

/// Handler for DELETE /caches/:name
pub async fn clear_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ClearResponse>> {
    if !state.registry.clear(&name) {
        return Err(CacheError::NotFound(format!("cache '{}'", name)));
    }

    Ok(Json(ClearResponse::new(vec![name])))
}

/// Handler for DELETE /caches
pub async fn clear_all_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let names = state.registry.names();
    state.registry.clear_all();

    Json(ClearResponse::new(names))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
