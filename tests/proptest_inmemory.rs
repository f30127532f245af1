//! Property-based tests for the in-memory backend and config merging.
//!
//! # Properties Tested
//!
//! 1. **Read-your-write**: set(k, v) then get(k) == v for any key/value
//! 2. **Bound**: the map never holds more than `max_size` entries after a set
//! 3. **Newest survives**: the key just written is never the one evicted
//! 4. **Merge identity**: merging an empty object changes nothing
//! 5. **Merge override**: every scalar in the override wins

use cache_switch::backend::{CacheBackend, InMemoryBackend};
use cache_switch::config::{deep_merge, CacheConfig};
use proptest::prelude::*;
use serde_json::{json, Value};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build runtime")
}

/// Keys that are not blank.
fn arb_key() -> impl Strategy<Value = String> {
    "[a-z0-9:_]{1,24}"
}

proptest! {
    #[test]
    fn prop_set_then_get_returns_value(
        key in arb_key(),
        value in prop::collection::vec(any::<u8>(), 0..256),
        ttl in 1i64..3600,
    ) {
        let rt = runtime();
        let backend = InMemoryBackend::new(16);

        let stored = rt.block_on(async {
            backend.set(&key, value.clone(), ttl).await.unwrap();
            backend.get(&key).await
        });

        prop_assert_eq!(stored, Some(value));
    }

    #[test]
    fn prop_size_never_exceeds_bound(
        max_size in 1usize..40,
        keys in prop::collection::vec(arb_key(), 1..120),
    ) {
        let rt = runtime();
        let backend = InMemoryBackend::new(max_size);

        for key in &keys {
            rt.block_on(backend.set(key, vec![1], 60)).unwrap();
            prop_assert!(backend.len() <= max_size);
            prop_assert!(rt.block_on(backend.exists(key)));
        }
    }

    #[test]
    fn prop_non_positive_ttl_always_rejected(key in arb_key(), ttl in i64::MIN..=0) {
        let rt = runtime();
        let backend = InMemoryBackend::new(4);

        let err = rt.block_on(backend.set(&key, vec![], ttl)).unwrap_err();
        prop_assert!(err.is_invalid_argument());
        prop_assert!(backend.is_empty());
    }

    #[test]
    fn prop_blank_keys_read_as_absent(spaces in "[ \t\n]{0,8}") {
        let rt = runtime();
        let backend = InMemoryBackend::new(4);

        prop_assert!(rt.block_on(backend.set(&spaces, vec![1], 10)).is_err());
        prop_assert_eq!(rt.block_on(backend.get(&spaces)), None);
        prop_assert!(!rt.block_on(backend.exists(&spaces)));
    }

    #[test]
    fn prop_merge_empty_object_is_identity(max_size in 1usize..10_000, port in 1u16..) {
        let mut base = json!({ "memory": { "max_size": max_size }, "redis": { "port": port } });
        let before = base.clone();
        deep_merge(&mut base, json!({}));
        prop_assert_eq!(base, before);
    }

    #[test]
    fn prop_merge_override_wins(max_size in 1usize..10_000, db in 0u32..16) {
        let config = CacheConfig::from_overrides(json!({
            "memory": { "max_size": max_size },
            "redis": { "db": db }
        })).unwrap();

        prop_assert_eq!(config.memory.max_size, max_size);
        prop_assert_eq!(config.redis.db, db);
        prop_assert_eq!(config.redis.host.as_str(), "localhost");
    }

    #[test]
    fn prop_merge_replaces_arrays_wholesale(
        old in prop::collection::vec(any::<i32>(), 0..8),
        new in prop::collection::vec(any::<i32>(), 0..8),
    ) {
        let mut base = json!({ "list": old });
        deep_merge(&mut base, json!({ "list": new.clone() }));
        prop_assert_eq!(&base["list"], &Value::from(new));
    }
}
