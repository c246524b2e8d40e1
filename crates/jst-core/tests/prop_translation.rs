//! Property-based tests for the translation engine
//!
//! These tests verify invariants that should hold for every registry, option
//! set, and source value: deterministic planning, segmentation without
//! duplicates, falsy-value preservation, and identity coercion.

mod test_support;

use jst_core::coerce::coerce;
use jst_core::{
    plan_pipeline, resolve, FieldType, ProviderRef, ProviderRegistry, TranslationOptions,
};
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::HashSet;
use test_support::MarkerProvider;

const NAMES: [&str; 6] = ["P0", "P1", "P2", "P3", "P4", "P5"];
const COLLECTIONS: [&str; 3] = ["X", "Y", "Z"];

/// Strategy for a registry layout: one optional collection per provider
fn registry_strategy() -> impl Strategy<Value = Vec<Option<usize>>> {
    proptest::collection::vec(proptest::option::of(0..COLLECTIONS.len()), 1..=NAMES.len())
}

/// Strategy for a single provider or collection reference
fn reference_strategy() -> impl Strategy<Value = ProviderRef> {
    prop_oneof![
        (0..NAMES.len()).prop_map(|i| ProviderRef::named(NAMES[i])),
        (0..COLLECTIONS.len()).prop_map(|i| ProviderRef::collection(COLLECTIONS[i])),
        Just(ProviderRef::named("Unknown")),
    ]
}

fn references() -> impl Strategy<Value = Option<Vec<ProviderRef>>> {
    proptest::option::of(proptest::collection::vec(reference_strategy(), 0..5))
}

fn build_registry(layout: &[Option<usize>]) -> ProviderRegistry {
    ProviderRegistry::build(
        Vec::new(),
        layout
            .iter()
            .enumerate()
            .map(|(i, collection)| MarkerProvider::new(NAMES[i], collection.map(|c| COLLECTIONS[c]), "").arc()),
    )
    .unwrap()
}

fn names(options: &TranslationOptions, registry: &ProviderRegistry) -> Vec<String> {
    plan_pipeline("field", options, None, registry)
        .unwrap()
        .names()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Strategy for values of a given field type
fn typed_value(target: FieldType) -> BoxedStrategy<Value> {
    match target {
        FieldType::String => "[a-zA-Z0-9 ]{0,12}".prop_map(Value::from).boxed(),
        FieldType::Number => prop_oneof![
            any::<i64>().prop_map(Value::from),
            (-1.0e9f64..1.0e9).prop_map(|f| json!(f)),
        ]
        .boxed(),
        FieldType::Boolean => any::<bool>().prop_map(Value::from).boxed(),
        FieldType::Object => proptest::collection::btree_map("[a-z]{1,4}", any::<i32>(), 0..4)
            .prop_map(|map| json!(map))
            .boxed(),
        FieldType::Array => proptest::collection::vec(any::<i32>(), 0..4)
            .prop_map(|items| json!(items))
            .boxed(),
    }
}

fn field_type_strategy() -> impl Strategy<Value = FieldType> {
    prop_oneof![
        Just(FieldType::String),
        Just(FieldType::Number),
        Just(FieldType::Boolean),
        Just(FieldType::Object),
        Just(FieldType::Array),
    ]
}

proptest! {
    #[test]
    fn prop_planning_is_deterministic(
        layout in registry_strategy(),
        pipeline in references(),
        start in references(),
        end in references(),
    ) {
        let registry = build_registry(&layout);
        let options = TranslationOptions { pipeline, start, end, ..TranslationOptions::default() };

        prop_assert_eq!(names(&options, &registry), names(&options, &registry));
    }

    #[test]
    fn prop_segmentation_never_duplicates(
        layout in registry_strategy(),
        start in references(),
        end in references(),
    ) {
        let registry = build_registry(&layout);
        let options = TranslationOptions { start, end, ..TranslationOptions::default() };

        let planned = names(&options, &registry);
        let unique: HashSet<_> = planned.iter().collect();
        prop_assert_eq!(unique.len(), planned.len());
        prop_assert_eq!(planned.len(), registry.len());
    }

    #[test]
    fn prop_plain_keys_resolve_like_lookups(key in "[a-z]{1,8}", value in any::<i32>()) {
        let source = json!({ key.clone(): value });
        prop_assert_eq!(resolve(&key, &source), source.get(&key).cloned());
    }

    #[test]
    fn prop_falsy_values_are_preserved(
        falsy in prop_oneof![Just(json!(0)), Just(json!(false)), Just(json!("")), Just(json!(0.0))],
        outer in "[a-z]{1,6}",
        inner in "[a-z]{1,6}",
    ) {
        let source = json!({ outer.clone(): { inner.clone(): falsy.clone() } });
        prop_assert_eq!(resolve(&format!("{}.{}", outer, inner), &source), Some(falsy));
    }

    #[test]
    fn prop_matching_types_coerce_to_identity(
        (target, value) in field_type_strategy().prop_flat_map(|t| (Just(t), typed_value(t))),
    ) {
        let coerced = coerce("field", Some(value.clone()), Some(target), &TranslationOptions::new()).unwrap();
        prop_assert_eq!(coerced, Some(value));
    }
}
