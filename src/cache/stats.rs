//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, evictions and
//! access latency, and aggregates snapshots across shards.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use serde::Serialize;

/// Number of latency samples kept for `average_access_time`.
pub const LATENCY_WINDOW: usize = 100;

// == Stats Counters ==
/// Live counters owned by a single cache instance.
#[derive(Debug, Clone, Default)]
pub struct StatsCounters {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// Rolling window of hit latencies in milliseconds
    access_times: VecDeque<f64>,
}

impl StatsCounters {
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    /// Increments the hit counter and samples the access latency.
    pub fn record_hit(&mut self, latency_ms: f64) {
        self.hits += 1;
        if self.access_times.len() == LATENCY_WINDOW {
            self.access_times.pop_front();
        }
        self.access_times.push_back(latency_ms);
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// Mean of the sampled latencies, 0 when nothing was sampled.
    pub fn average_access_time(&self) -> f64 {
        if self.access_times.is_empty() {
            0.0
        } else {
            self.access_times.iter().sum::<f64>() / self.access_times.len() as f64
        }
    }

    pub fn samples(&self) -> usize {
        self.access_times.len()
    }

    // == Reset ==
    /// Zeroes every counter and drops latency samples.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// == Cache Stats ==
/// Point-in-time statistics snapshot for a cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Current number of entries
    pub size: usize,
    /// Configured entry budget
    pub max_size: Option<usize>,
    /// Number of entries evicted by a budget
    pub evictions: u64,
    /// Sum of estimated entry sizes in bytes
    pub memory_usage: usize,
    /// Configured memory budget in bytes
    pub max_memory_usage: Option<usize>,
    /// Mean hit latency in milliseconds over the rolling window
    pub average_access_time: f64,
    /// hits / (hits + misses), 0 with no requests
    pub hit_rate: f64,
    /// Per-shard breakdown, keyed `shard-<i>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_stats: Option<BTreeMap<String, CacheStats>>,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(hits: u64, misses: u64) -> f64 {
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    // == Aggregate ==
    /// Combines per-shard snapshots into one.
    ///
    /// Counters and bounds are summed, the hit rate is recomputed from the
    /// summed counters, and the average access time is weighted by each
    /// shard's hit count.
    pub fn aggregate(shards: Vec<CacheStats>) -> Self {
        let mut total = CacheStats::default();
        let mut weighted_time = 0.0;
        let mut max_size: Option<usize> = None;
        let mut max_memory: Option<usize> = None;

        for shard in &shards {
            total.hits += shard.hits;
            total.misses += shard.misses;
            total.size += shard.size;
            total.evictions += shard.evictions;
            total.memory_usage += shard.memory_usage;
            if let Some(bound) = shard.max_size {
                max_size = Some(max_size.unwrap_or(0) + bound);
            }
            if let Some(bound) = shard.max_memory_usage {
                max_memory = Some(max_memory.unwrap_or(0) + bound);
            }
            weighted_time += shard.average_access_time * shard.hits as f64;
        }

        total.max_size = max_size;
        total.max_memory_usage = max_memory;
        total.hit_rate = Self::hit_rate(total.hits, total.misses);
        total.average_access_time = if total.hits == 0 {
            0.0
        } else {
            weighted_time / total.hits as f64
        };
        total.segment_stats = Some(
            shards
                .into_iter()
                .enumerate()
                .map(|(i, stats)| (format!("shard-{}", i), stats))
                .collect(),
        );
        total
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "size={}/{} memory={}/{} hits={} misses={} evictions={} hit_rate={:.1}% avg_access={:.3}ms",
            self.size,
            bound(self.max_size),
            self.memory_usage,
            bound(self.max_memory_usage),
            self.hits,
            self.misses,
            self.evictions,
            self.hit_rate * 100.0,
            self.average_access_time,
        )?;
        if let Some(segments) = &self.segment_stats {
            write!(f, " segments={}", segments.len())?;
        }
        Ok(())
    }
}

fn bound(value: Option<usize>) -> String {
    value.map_or_else(|| "unbounded".to_string(), |v| v.to_string())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn shard(hits: u64, misses: u64, size: usize, avg: f64) -> CacheStats {
        CacheStats {
            hits,
            misses,
            size,
            max_size: Some(10),
            evictions: 1,
            memory_usage: size * 4,
            max_memory_usage: None,
            average_access_time: avg,
            hit_rate: CacheStats::hit_rate(hits, misses),
            segment_stats: None,
        }
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(CacheStats::hit_rate(0, 0), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        assert_eq!(CacheStats::hit_rate(3, 0), 1.0);
        assert_eq!(CacheStats::hit_rate(0, 2), 0.0);
        assert_eq!(CacheStats::hit_rate(1, 1), 0.5);
    }

    #[test]
    fn test_counters_record_and_reset() {
        let mut counters = StatsCounters::new();
        counters.record_hit(2.0);
        counters.record_hit(4.0);
        counters.record_miss();
        counters.record_eviction();

        assert_eq!(counters.hits, 2);
        assert_eq!(counters.misses, 1);
        assert_eq!(counters.evictions, 1);
        assert_eq!(counters.average_access_time(), 3.0);

        counters.reset();
        assert_eq!(counters.hits, 0);
        assert_eq!(counters.samples(), 0);
        assert_eq!(counters.average_access_time(), 0.0);
    }

    #[test]
    fn test_latency_window_is_bounded() {
        let mut counters = StatsCounters::new();
        for _ in 0..LATENCY_WINDOW {
            counters.record_hit(100.0);
        }
        for _ in 0..LATENCY_WINDOW {
            counters.record_hit(1.0);
        }

        assert_eq!(counters.samples(), LATENCY_WINDOW);
        assert_eq!(counters.average_access_time(), 1.0);
    }

    #[test]
    fn test_aggregate_sums_and_recomputes() {
        let total = CacheStats::aggregate(vec![shard(3, 1, 2, 2.0), shard(1, 3, 5, 6.0)]);

        assert_eq!(total.hits, 4);
        assert_eq!(total.misses, 4);
        assert_eq!(total.size, 7);
        assert_eq!(total.evictions, 2);
        assert_eq!(total.memory_usage, 28);
        assert_eq!(total.max_size, Some(20));
        assert_eq!(total.max_memory_usage, None);
        assert_eq!(total.hit_rate, 0.5);
        // (2.0 * 3 + 6.0 * 1) / 4
        assert_eq!(total.average_access_time, 3.0);

        let segments = total.segment_stats.unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments["shard-1"].size, 5);
    }

    #[test]
    fn test_aggregate_without_hits_has_zero_access_time() {
        let total = CacheStats::aggregate(vec![shard(0, 2, 0, 0.0), shard(0, 0, 0, 0.0)]);
        assert_eq!(total.average_access_time, 0.0);
        assert_eq!(total.hit_rate, 0.0);
    }

    #[test]
    fn test_serialize_camel_case() {
        let json = serde_json::to_value(shard(1, 0, 1, 0.5)).unwrap();
        assert_eq!(json["maxSize"], 10);
        assert_eq!(json["hitRate"], 1.0);
        assert!(json["maxMemoryUsage"].is_null());
        assert!(json.get("segmentStats").is_none());
    }

    #[test]
    fn test_display_summary() {
        let line = shard(1, 1, 2, 0.25).to_string();
        assert!(line.contains("size=2/10"));
        assert!(line.contains("memory=8/unbounded"));
        assert!(line.contains("hit_rate=50.0%"));
    }
}
