//! Error types for the memo cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache library and its admin server.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Invalid construction options
    #[error("Invalid cache configuration: {0}")]
    Configuration(String),

    /// A value could not be serialized for size estimation
    #[error("Size estimation failed: {0}")]
    SizeEstimation(String),

    /// A background revalidation callback failed
    #[error("Revalidation of '{key}' failed: {message}")]
    Revalidation { key: String, message: String },

    /// Cache or key not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl CacheError {
    /// Wraps a revalidation failure for logging.
    pub fn revalidation(key: impl Into<String>, err: &anyhow::Error) -> Self {
        CacheError::Revalidation {
            key: key.into(),
            message: format!("{:#}", err),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) | CacheError::Configuration(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
