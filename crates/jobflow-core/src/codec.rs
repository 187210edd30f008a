//! Wire codec for configuration trees.
//!
//! Cluster documents are assembled as snake_case JSON trees. The service
//! accepts them in two shapes depending on the signing scheme:
//!
//! - **Legacy**: a flat list of `Key.member.N.Nested=value` query parameters
//!   ([`flatten_legacy`]).
//! - **Modern**: the same tree with camel-cased keys, sent as JSON
//!   ([`to_wire_tree`]).
//!
//! Keys under [`UNCONVERTED_KEY`] are literal property names on the service
//! side and keep their casing in the modern form.

use serde_json::{Map, Value};

/// The key whose subtree keeps its original key casing in the modern form.
pub const UNCONVERTED_KEY: &str = "configurations";

/// Camel-case a snake_case identifier.
///
/// Each `_`-separated segment has its first character upper-cased and the
/// rest of the segment left untouched; `/` becomes `::` with the following
/// character upper-cased. Already camel-cased input comes back unchanged.
///
/// ```
/// use jobflow_core::camelize;
///
/// assert_eq!(camelize("instance_count"), "InstanceCount");
/// assert_eq!(camelize("size_in_GB"), "SizeInGB");
/// assert_eq!(camelize("InstanceCount"), "InstanceCount");
/// ```
#[must_use]
pub fn camelize(word: &str) -> String {
    let mut namespaced = String::with_capacity(word.len() + 2);
    let mut chars = word.chars();
    while let Some(c) = chars.next() {
        if c == '/' {
            namespaced.push_str("::");
            if let Some(next) = chars.next() {
                namespaced.extend(next.to_uppercase());
            }
        } else {
            namespaced.push(c);
        }
    }

    let mut out = String::with_capacity(namespaced.len());
    let mut at_start = true;
    let mut after_underscore = false;
    for c in namespaced.chars() {
        if at_start {
            out.extend(c.to_uppercase());
            at_start = false;
        } else if after_underscore {
            out.extend(c.to_uppercase());
            after_underscore = false;
        } else if c == '_' {
            after_underscore = true;
        } else {
            out.push(c);
        }
    }
    // A trailing underscore has nothing to capitalize and is kept.
    if after_underscore {
        out.push('_');
    }
    out
}

/// Flatten a configuration mapping into legacy query parameters.
///
/// Mapping keys are camel-cased and joined with `.`; sequence elements are
/// addressed as `<Key>.member.<n>` counting from 1. Scalars are rendered
/// as-is and `null` leaves are omitted. Pairs come out in mapping insertion
/// order.
///
/// ```
/// use jobflow_core::flatten_legacy;
/// use serde_json::json;
///
/// let params = json!({"job_flow_ids": ["j-1", "j-2"]});
/// let pairs = flatten_legacy(params.as_object().unwrap());
/// assert_eq!(pairs, vec![
///     ("JobFlowIds.member.1".to_string(), "j-1".to_string()),
///     ("JobFlowIds.member.2".to_string(), "j-2".to_string()),
/// ]);
/// ```
#[must_use]
pub fn flatten_legacy(params: &Map<String, Value>) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for (key, value) in params {
        flatten_into(camelize(key), value, &mut out);
    }
    out
}

fn flatten_into(prefix: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                flatten_into(format!("{prefix}.{}", camelize(key)), nested, out);
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_into(format!("{prefix}.member.{}", index + 1), item, out);
            }
        }
        Value::Null => {}
        Value::String(s) => out.push((prefix, s.clone())),
        Value::Bool(b) => out.push((prefix, b.to_string())),
        Value::Number(n) => out.push((prefix, n.to_string())),
    }
}

/// Convert a configuration tree into the modern JSON wire form.
///
/// With `camelize_keys` set every mapping key is camel-cased. The
/// [`UNCONVERTED_KEY`] entry itself is camel-cased, but everything beneath it
/// keeps its original spelling, at any depth. Nested `configurations` keys
/// are camel-cased the same way.
#[must_use]
pub fn to_wire_tree(value: &Value, camelize_keys: bool) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| to_wire_tree(item, camelize_keys))
                .collect(),
        ),
        Value::Object(map) => {
            let mut converted = Map::with_capacity(map.len());
            for (key, nested) in map {
                if key == UNCONVERTED_KEY {
                    converted.insert(camelize(key), to_wire_tree(nested, false));
                } else {
                    let wire_key = if camelize_keys {
                        camelize(key)
                    } else {
                        key.clone()
                    };
                    converted.insert(wire_key, to_wire_tree(nested, camelize_keys));
                }
            }
            Value::Object(converted)
        }
        scalar => scalar.clone(),
    }
}
