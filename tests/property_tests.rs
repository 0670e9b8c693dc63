//! Property-based tests for the metadata deep-key matcher and chain cache.

use chainlog::{ChainCache, Metadata, OwnerRef};
use proptest::prelude::*;
use serde_json::{json, Value};

// ============================================================================
// Strategy Generators
// ============================================================================

/// Generate object keys that never collide with the planted marker key
fn key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z]{1,12}")
        .expect("valid regex")
        .prop_filter("not the marker", |s| s != "marker")
}

/// Generate arbitrary nested JSON values up to a bounded depth
fn value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        "[a-z]{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::hash_map(key_strategy(), inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Bury `marker: payload` somewhere inside `tree` at the given path depth,
/// returning the modified tree.
fn plant_marker(mut tree: Value, path: Vec<String>) -> Value {
    let mut cursor = &mut tree;
    for segment in path {
        if !cursor.is_object() {
            *cursor = json!({});
        }
        cursor = cursor
            .as_object_mut()
            .expect("just ensured object")
            .entry(segment)
            .or_insert(json!({}));
    }
    if !cursor.is_object() {
        *cursor = json!({});
    }
    cursor
        .as_object_mut()
        .expect("just ensured object")
        .insert("marker".to_string(), json!(true));
    tree
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// A key planted at any depth is always found by the deep matcher
    #[test]
    fn planted_key_is_always_found(
        tree in value_strategy(),
        path in prop::collection::vec(key_strategy(), 0..4),
    ) {
        let planted = plant_marker(json!({ "root": tree }), path);
        let meta = Metadata::from_value(planted);
        prop_assert!(meta.has_key("marker"));
    }

    /// A key that occurs nowhere in the tree never matches
    #[test]
    fn absent_key_never_matches(tree in value_strategy()) {
        let meta = Metadata::from_value(json!({ "root": tree }));
        prop_assert!(!meta.has_key("marker"));
    }

    /// has_all_keys is exactly the conjunction of per-key has_key
    #[test]
    fn has_all_keys_is_conjunction(
        tree in value_strategy(),
        keys in prop::collection::vec(key_strategy(), 1..4),
    ) {
        let meta = Metadata::from_value(json!({ "root": tree }));
        let expected = keys.iter().all(|k| meta.has_key(k));
        prop_assert_eq!(meta.has_all_keys(&keys), expected);
    }

    /// Resolving with any sequence of implicit calls never changes the
    /// chain minted on first use
    #[test]
    fn implicit_resolves_are_stable(calls in 1..20usize) {
        let cache = ChainCache::new();
        let owner = OwnerRef::new("User", 1);
        let first = cache.resolve(&owner, None);
        for _ in 0..calls {
            prop_assert_eq!(cache.resolve(&owner, None), first.clone());
        }
    }

    /// An explicit non-empty chain always wins and sticks
    #[test]
    fn explicit_chain_wins_and_sticks(chain in "[a-zA-Z0-9_-]{1,24}") {
        let cache = ChainCache::new();
        let owner = OwnerRef::new("User", 1);
        cache.resolve(&owner, None);
        let resolved = cache.resolve(&owner, Some(&chain));
        prop_assert_eq!(&resolved, &chain);
        prop_assert_eq!(cache.resolve(&owner, None), chain);
    }
}
