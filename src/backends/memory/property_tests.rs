//! Property-Based Tests for the memory engine
//!
//! Exercises `CacheStore` directly and `MemoryBackend` through the `Backend` trait.

use std::collections::HashSet;
use std::time::Duration;

use bytes::Bytes;
use proptest::prelude::*;

use super::{CacheStore, MemoryBackend};
use crate::backends::{Backend, RequestContext};
use crate::error::CacheError;

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 100;
const TEST_DEFAULT_TTL: u64 = 300;

// == Strategies ==
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,64}"
}

fn valid_value_strategy() -> impl Strategy<Value = Bytes> {
    prop::collection::vec(any::<u8>(), 1..256).prop_map(Bytes::from)
}

fn ctx() -> RequestContext {
    RequestContext::new(Duration::from_secs(1))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Storing then reading a key before expiry returns the exact bytes.
    #[test]
    fn prop_roundtrip_storage(key in valid_key_strategy(), value in valid_value_strategy()) {
        let backend = MemoryBackend::new(TEST_MAX_ENTRIES, TEST_DEFAULT_TTL);

        let retrieved = tokio_test::block_on(async {
            backend.put(&ctx(), &key, value.clone(), 0).await?;
            backend.get(&ctx(), &key).await
        });

        prop_assert_eq!(retrieved.unwrap(), value);
    }

    // A key that was never stored is always NotFound.
    #[test]
    fn prop_missing_key_is_not_found(
        stored in prop::collection::hash_set(valid_key_strategy(), 0..20),
        absent in valid_key_strategy(),
    ) {
        prop_assume!(!stored.contains(&absent));
        let backend = MemoryBackend::new(TEST_MAX_ENTRIES, TEST_DEFAULT_TTL);

        let result = tokio_test::block_on(async {
            for key in &stored {
                backend.put(&ctx(), key, Bytes::from_static(b"v"), 0).await?;
            }
            backend.get(&ctx(), &absent).await
        });

        prop_assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    // Writing V1 then V2 under the same key leaves only V2.
    #[test]
    fn prop_overwrite_semantics(
        key in valid_key_strategy(),
        value1 in valid_value_strategy(),
        value2 in valid_value_strategy()
    ) {
        let mut store = CacheStore::new(TEST_MAX_ENTRIES, TEST_DEFAULT_TTL);

        store.set(key.clone(), value1, 0).unwrap();
        store.set(key.clone(), value2.clone(), 0).unwrap();

        prop_assert_eq!(store.get(&key).unwrap(), value2);
        prop_assert_eq!(store.len(), 1);
    }

    // The store never holds more than its capacity.
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec(
            (valid_key_strategy(), valid_value_strategy()),
            1..200
        )
    ) {
        let max_entries = 50;
        let mut store = CacheStore::new(max_entries, TEST_DEFAULT_TTL);

        for (key, value) in entries {
            let _ = store.set(key, value, 0);
            prop_assert!(store.len() <= max_entries);
        }
    }

    // Once over capacity, the first keys inserted are the first evicted.
    #[test]
    fn prop_lru_eviction_order(
        keys in prop::collection::hash_set(valid_key_strategy(), 6..30)
    ) {
        let capacity = 5;
        let keys: Vec<String> = keys.into_iter().collect();
        let mut store = CacheStore::new(capacity, TEST_DEFAULT_TTL);

        for key in &keys {
            store.set(key.clone(), Bytes::from_static(b"v"), 0).unwrap();
        }

        let survivors: HashSet<&String> = keys.iter().rev().take(capacity).collect();
        for key in &keys {
            let found = store.get(key).is_ok();
            prop_assert_eq!(found, survivors.contains(key), "key {}", key);
        }
    }
}
