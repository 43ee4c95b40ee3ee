#![cfg(feature = "test-utils")]

use proptest::prelude::*;
use serde_json::Value;
use twig::proptest_strategies::*;
use twig::state::{is_composite, merge_state};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_absent_state_becomes_partial(partial in arb_state()) {
        prop_assert_eq!(merge_state(None, &partial), partial);
    }

    #[test]
    fn prop_merge_keeps_keys_missing_from_partial(
        state in arb_state(),
        partial in arb_state(),
    ) {
        let merged = merge_state(Some(&state), &partial);
        let (Value::Object(old), Value::Object(new), Value::Object(out)) = (&state, &partial, &merged) else {
            unreachable!("arb_state yields objects");
        };

        for (key, value) in old {
            if !new.contains_key(key) {
                prop_assert_eq!(out.get(key), Some(value));
            }
        }
        prop_assert!(new.keys().all(|key| out.contains_key(key)));
    }

    #[test]
    fn prop_scalar_entries_overwrite_scalar_slots(
        state in arb_state(),
        partial in arb_state(),
    ) {
        let merged = merge_state(Some(&state), &partial);
        for (key, value) in partial.as_object().unwrap() {
            let slot_is_composite = state.get(key).is_some_and(is_composite);
            if !is_composite(value) && !slot_is_composite {
                prop_assert_eq!(&merged[key.as_str()], value);
            }
        }
    }

    #[test]
    fn prop_composite_slots_survive_scalar_entries(
        state in arb_state(),
        partial in arb_state(),
    ) {
        let merged = merge_state(Some(&state), &partial);
        for (key, value) in partial.as_object().unwrap() {
            if let Some(old) = state.get(key).filter(|old| is_composite(old)) {
                if !is_composite(value) {
                    prop_assert_eq!(&merged[key.as_str()], old);
                }
            }
        }
    }

    #[test]
    fn prop_merge_is_idempotent(
        state in arb_state(),
        partial in arb_state(),
    ) {
        let once = merge_state(Some(&state), &partial);
        let twice = merge_state(Some(&once), &partial);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_merge_does_not_touch_its_inputs(
        state in arb_state(),
        partial in arb_value(),
    ) {
        let state_before = state.clone();
        let partial_before = partial.clone();
        let _ = merge_state(Some(&state), &partial);
        prop_assert_eq!(state, state_before);
        prop_assert_eq!(partial, partial_before);
    }
}
