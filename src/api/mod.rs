//! API Module
//!
//! HTTP handlers and routing for the cache admin API.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Statistics for every cache
//! - `GET /caches` - List caches with their statistics
//! - `DELETE /caches` - Clear every cache
//! - `GET /caches/:name/stats` - Statistics for one cache
//! - `DELETE /caches/:name` - Clear one cache
//! - `PUT /caches/:name/entries` - Store a key-value pair
//! - `GET /caches/:name/entries/:key` - Retrieve a value by key
//! - `DELETE /caches/:name/entries/:key` - Delete a key

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
