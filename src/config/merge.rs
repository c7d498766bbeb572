//! Deep merge for plugin configuration trees.

use serde_json::{Map, Value};

/// Merge `overrides` onto a copy of `base`.
///
/// For each key in `overrides`: when both sides are objects the merge
/// recurses, otherwise the override replaces the base value. Arrays are
/// values like any other and are never merged element-wise. A `null`
/// override means "use the defaults". With no base the result is a copy of
/// `overrides`.
///
/// The result never aliases either input.
pub fn merge_config(base: Option<&Value>, overrides: &Value) -> Value {
    let Some(base) = base else {
        return overrides.clone();
    };

    match (base, overrides) {
        (_, Value::Null) => base.clone(),
        (Value::Object(base), Value::Object(overrides)) => {
            let mut merged = base.clone();
            merge_into(&mut merged, overrides);
            Value::Object(merged)
        }
        _ => overrides.clone(),
    }
}

fn merge_into(target: &mut Map<String, Value>, overrides: &Map<String, Value>) {
    for (key, value) in overrides {
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(nested)) => merge_into(existing, nested),
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}
