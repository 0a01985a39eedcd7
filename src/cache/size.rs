//! Size Estimation Module
//!
//! Approximates how much memory a cached value occupies. The numbers are
//! advisory and only drive the memory budget.

use serde::Serialize;
use tracing::debug;

use crate::error::{CacheError, Result};

// == Size Estimator Trait ==
/// Strategy for estimating the size of a cached value in bytes.
pub trait SizeEstimator<T>: Send + Sync {
    /// Estimates the size of `value`.
    fn estimate(&self, value: &T) -> Result<usize>;
}

impl<T, F> SizeEstimator<T> for F
where
    F: Fn(&T) -> usize + Send + Sync,
{
    fn estimate(&self, value: &T) -> Result<usize> {
        Ok(self(value))
    }
}

// == JSON Size Estimator ==
/// Serializes the value to JSON and counts two bytes per UTF-16 code unit.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSizeEstimator;

impl<T: Serialize> SizeEstimator<T> for JsonSizeEstimator {
    fn estimate(&self, value: &T) -> Result<usize> {
        let json =
            serde_json::to_string(value).map_err(|e| CacheError::SizeEstimation(e.to_string()))?;
        Ok(json.encode_utf16().count() * 2)
    }
}

/// Runs an estimator, treating failures as a zero-sized value.
pub(crate) fn estimate_or_zero<T>(estimator: &dyn SizeEstimator<T>, key: &str, value: &T) -> usize {
    match estimator.estimate(value) {
        Ok(size) => size,
        Err(e) => {
            debug!(key, error = %e, "size estimation failed, counting entry as 0 bytes");
            0
        }
    }
}
