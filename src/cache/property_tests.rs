//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check eviction, accounting and routing properties.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::thread::sleep;
use std::time::Duration;

use crate::cache::{hash32, AdvancedCache, CacheOptions, JsonSizeEstimator, ShardedCache, SizeEstimator};

// == Test Configuration ==
const TEST_TTL_MS: u64 = 300_000;

// == Strategies ==
/// Generates cache keys
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,64}".prop_map(|s| s)
}

/// Generates cache values
fn valid_value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 é]{1,256}".prop_map(|s| s)
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Has { key: String },
    Delete { key: String },
}

/// Draws keys from a small pool so operations collide.
fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    let key = "k[0-9]{1,2}";
    prop_oneof![
        (key, valid_value_strategy()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        key.prop_map(|key| CacheOp::Get { key }),
        key.prop_map(|key| CacheOp::Has { key }),
        key.prop_map(|key| CacheOp::Delete { key }),
    ]
}

fn new_store(options: CacheOptions) -> AdvancedCache<String> {
    AdvancedCache::new(options).unwrap()
}

fn estimated(value: &String) -> usize {
    JsonSizeEstimator.estimate(value).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Hits and misses match what get() reported; has() and delete() count nothing.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..80)) {
        let store = new_store(CacheOptions::new(TEST_TTL_MS).with_max_size(20));
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    store.set(key, value);
                }
                CacheOp::Get { key } => match store.get(&key) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                CacheOp::Has { key } => {
                    store.has(&key);
                }
                CacheOp::Delete { key } => {
                    store.delete(&key);
                }
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits);
        prop_assert_eq!(stats.misses, expected_misses);
        prop_assert_eq!(stats.size, store.len());
        let total = expected_hits + expected_misses;
        let rate = if total == 0 { 0.0 } else { expected_hits as f64 / total as f64 };
        prop_assert_eq!(stats.hit_rate, rate);
    }

    // Memory usage always equals the sum of live entry sizes and key order
    // mirrors the entry map exactly.
    #[test]
    fn prop_memory_accounting(ops in prop::collection::vec(cache_op_strategy(), 1..80)) {
        let store = new_store(CacheOptions::new(TEST_TTL_MS).with_max_size(10));
        let mut model: HashMap<String, String> = HashMap::new();

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    store.set(key.clone(), value.clone());
                    model.insert(key, value);
                }
                CacheOp::Delete { key } => {
                    store.delete(&key);
                    model.remove(&key);
                }
                CacheOp::Get { key } => {
                    store.get(&key);
                }
                CacheOp::Has { key } => {
                    store.has(&key);
                }
            }
            model.retain(|k, _| store.has(k));

            let keys = store.keys();
            let unique: HashSet<&String> = keys.iter().collect();
            prop_assert_eq!(unique.len(), keys.len(), "duplicate key in recency order");
            prop_assert_eq!(keys.len(), store.len());

            let expected: usize = model.values().map(estimated).sum();
            prop_assert_eq!(store.stats().memory_usage, expected);
        }
    }

    // Storing then reading before expiry returns the stored value.
    #[test]
    fn prop_roundtrip_storage(key in valid_key_strategy(), value in valid_value_strategy()) {
        let store = new_store(CacheOptions::new(TEST_TTL_MS));

        store.set(key.clone(), value.clone());
        prop_assert_eq!(store.get(&key), Some(value));
    }

    // The second write to a key wins and does not add an entry.
    #[test]
    fn prop_overwrite_semantics(
        key in valid_key_strategy(),
        value1 in valid_value_strategy(),
        value2 in valid_value_strategy()
    ) {
        let store = new_store(CacheOptions::new(TEST_TTL_MS));

        store.set(key.clone(), value1);
        store.set(key.clone(), value2.clone());

        prop_assert_eq!(store.stats().memory_usage, estimated(&value2));
        prop_assert_eq!(store.get(&key), Some(value2));
        prop_assert_eq!(store.len(), 1);
    }

    // The entry count never exceeds the configured maximum.
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec(
            (valid_key_strategy(), valid_value_strategy()),
            1..200
        )
    ) {
        let max_entries = 50;
        let store = new_store(CacheOptions::new(TEST_TTL_MS).with_max_size(max_entries));

        for (key, value) in entries {
            store.set(key, value);
            prop_assert!(store.len() <= max_entries);
        }
    }

    // After every set the estimated memory stays within budget.
    #[test]
    fn prop_memory_budget_enforcement(
        entries in prop::collection::vec(
            (valid_key_strategy(), valid_value_strategy()),
            1..100
        ),
        budget in 64usize..2048
    ) {
        let store = new_store(CacheOptions::new(TEST_TTL_MS).with_max_memory_usage(budget));

        for (key, value) in entries {
            store.set(key, value);
            let stats = store.stats();
            prop_assert!(stats.memory_usage <= budget,
                "memory {} exceeds budget {}", stats.memory_usage, budget);
        }
    }

    // Routing depends only on the key and the shard count.
    #[test]
    fn prop_sharded_routing_is_deterministic(
        keys in prop::collection::vec(valid_key_strategy(), 1..50),
        segments in 2usize..16
    ) {
        let a: ShardedCache<String> =
            ShardedCache::new(CacheOptions::new(TEST_TTL_MS).with_segment_count(segments)).unwrap();
        let b: ShardedCache<String> =
            ShardedCache::new(CacheOptions::new(TEST_TTL_MS).with_segment_count(segments)).unwrap();

        for key in &keys {
            let index = a.shard_index(key);
            prop_assert!(index < segments);
            prop_assert_eq!(index, b.shard_index(key));
            prop_assert_eq!(index, hash32(key).unsigned_abs() as usize % segments);
        }
    }

    // Sharded size equals the number of distinct keys written.
    #[test]
    fn prop_sharded_size_matches_distinct_keys(
        keys in prop::collection::hash_set(valid_key_strategy(), 1..100)
    ) {
        let cache: ShardedCache<String> =
            ShardedCache::new(CacheOptions::new(TEST_TTL_MS).with_segment_count(4)).unwrap();

        for key in &keys {
            cache.set(key.clone(), key.clone());
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.size, keys.len());
        let segments = stats.segment_stats.unwrap();
        prop_assert_eq!(segments.values().map(|s| s.size).sum::<usize>(), keys.len());
    }
}

// Separate proptest block with fewer cases for time-sensitive TTL tests
proptest! {
    #![proptest_config(ProptestConfig::with_cases(5))]

    // After the TTL elapses with no writes, the key is gone.
    #[test]
    fn prop_ttl_expiration_behavior(
        key in valid_key_strategy(),
        value in valid_value_strategy()
    ) {
        let store = new_store(CacheOptions::new(100));

        store.set(key.clone(), value.clone());
        prop_assert_eq!(store.get(&key), Some(value));

        sleep(Duration::from_millis(150));

        prop_assert!(!store.has(&key));
        prop_assert_eq!(store.get(&key), None);
    }
}

// Property tests for LRU eviction behavior
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // With the cache full, a new key evicts the first-written key.
    #[test]
    fn prop_lru_eviction_order(
        initial_keys in prop::collection::vec(valid_key_strategy(), 3..10),
        new_key in valid_key_strategy(),
        new_value in valid_value_strategy()
    ) {
        let mut unique_keys: Vec<String> = Vec::new();
        for key in initial_keys {
            if !unique_keys.contains(&key) {
                unique_keys.push(key);
            }
        }

        prop_assume!(unique_keys.len() >= 2);
        prop_assume!(!unique_keys.contains(&new_key));

        let capacity = unique_keys.len();
        let store = new_store(CacheOptions::new(TEST_TTL_MS).with_max_size(capacity));

        let oldest_key = unique_keys[0].clone();
        for key in &unique_keys {
            store.set(key.clone(), format!("value_{}", key));
        }
        prop_assert_eq!(store.len(), capacity);

        store.set(new_key.clone(), new_value);

        prop_assert_eq!(store.len(), capacity);
        prop_assert!(!store.has(&oldest_key), "oldest key '{}' should be evicted", oldest_key);
        prop_assert!(store.has(&new_key));
        for key in unique_keys.iter().skip(1) {
            prop_assert!(store.has(key), "key '{}' should survive", key);
        }
    }

    // Reading the oldest key protects it; the next oldest goes instead.
    #[test]
    fn prop_lru_access_tracking(
        keys in prop::collection::vec(valid_key_strategy(), 3..8),
        new_key in valid_key_strategy(),
        new_value in valid_value_strategy()
    ) {
        let mut unique_keys: Vec<String> = Vec::new();
        for key in keys {
            if !unique_keys.contains(&key) {
                unique_keys.push(key);
            }
        }

        prop_assume!(unique_keys.len() >= 3);
        prop_assume!(!unique_keys.contains(&new_key));

        let capacity = unique_keys.len();
        let store = new_store(CacheOptions::new(TEST_TTL_MS).with_max_size(capacity));

        for key in &unique_keys {
            store.set(key.clone(), format!("value_{}", key));
        }

        let accessed_key = unique_keys[0].clone();
        prop_assert!(store.get(&accessed_key).is_some());
        let expected_evicted = unique_keys[1].clone();

        store.set(new_key.clone(), new_value);

        prop_assert!(store.has(&accessed_key));
        prop_assert!(!store.has(&expected_evicted));
        prop_assert!(store.has(&new_key));
    }
}
