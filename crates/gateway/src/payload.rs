//! Data-payload coercion.
//!
//! The gateway wire format requires `data` to be a homogeneous map of string
//! keys to string values. Callers hand us arbitrary JSON; this module defines
//! the total, documented coercion applied before transport.

use std::collections::BTreeMap;

use serde_json::Value;

/// Coerce an optional JSON payload into an ordered string map.
///
/// - `None`, non-object values, and `null` coerce to an empty map.
/// - String values are taken verbatim (no added quotes).
/// - Every other value (numbers, booleans, arrays, nested objects) is
///   rendered as its compact JSON text.
pub fn coerce_data(data: Option<&Value>) -> BTreeMap<String, String> {
    let Some(Value::Object(map)) = data else {
        return BTreeMap::new();
    };

    map.iter()
        .map(|(k, v)| {
            let s = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), s)
        })
        .collect()
}
