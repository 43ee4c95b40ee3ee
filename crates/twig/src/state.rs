//! Component state merging
//!
//! State is an arbitrary JSON-like value. Updates merge into it key-wise:
//! nested composites merge recursively, anything else overwrites. Keys that
//! only exist in the old state are kept.

use serde_json::Value;

/// Objects and arrays merge; every other value overwrites.
pub fn is_composite(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// Merge `partial` into `current`, returning the new state.
///
/// An absent or non-composite current state is replaced wholesale. Scalars in
/// `partial` never replace a composite already in place.
pub fn merge_state(current: Option<&Value>, partial: &Value) -> Value {
    match current {
        Some(current) if is_composite(current) => merge_value(current, partial),
        _ => partial.clone(),
    }
}

fn merge_value(current: &Value, partial: &Value) -> Value {
    match (current, partial) {
        (Value::Object(old), Value::Object(new)) => {
            let mut merged = old.clone();
            for (key, value) in new {
                let next = match merged.get(key) {
                    Some(existing) if is_composite(existing) => merge_value(existing, value),
                    _ => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Value::Object(merged)
        }
        (Value::Array(old), Value::Array(new)) => {
            let mut merged = old.clone();
            for (index, value) in new.iter().enumerate() {
                match merged.get(index) {
                    Some(existing) if is_composite(existing) => {
                        merged[index] = merge_value(existing, value);
                    }
                    Some(_) => merged[index] = value.clone(),
                    None => merged.push(value.clone()),
                }
            }
            Value::Array(merged)
        }
        // Merging a scalar into a composite leaves the composite as it was.
        (_, partial) if !is_composite(partial) => current.clone(),
        // Object and array swapped places: the new value wins.
        _ => partial.clone(),
    }
}
