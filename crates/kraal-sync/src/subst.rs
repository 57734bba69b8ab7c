use indexmap::IndexSet;
use serde_json::Value;

use crate::resolver::TempIdLookup;
use crate::temp_id::is_temp_id;

/// Rebuilds `value` with every resolvable placeholder string leaf replaced by
/// its canonical ID. Arrays map element-wise, objects walk key-by-key, all
/// other leaves clone through unchanged.
///
/// The input is never mutated. Nesting depth is unbounded but the payload
/// must be acyclic, which ordinary JSON-shaped write bodies are by
/// construction.
pub fn substitute<L: TempIdLookup + ?Sized>(lookup: &L, value: &Value) -> Value {
    match value {
        Value::String(s) if is_temp_id(s) => match lookup.lookup(s) {
            Some(canonical) => Value::String(canonical.to_owned()),
            None => value.clone(),
        },
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| substitute(lookup, v)).collect())
        }
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute(lookup, v)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

/// Collects every placeholder string leaf that has no mapping yet, deduped in
/// first-seen order. Returns an empty vec for payloads without placeholders.
pub fn find_unresolved_ids<L: TempIdLookup + ?Sized>(lookup: &L, value: &Value) -> Vec<String> {
    let mut found = IndexSet::new();
    walk_strings(value, &mut |s| {
        if is_temp_id(s) && !lookup.is_resolved(s) {
            found.insert(s.to_owned());
        }
    });
    found.into_iter().collect()
}

/// Every placeholder string leaf in the payload, resolved or not, deduped in
/// first-seen order.
pub fn collect_temp_ids(value: &Value) -> Vec<String> {
    let mut found = IndexSet::new();
    walk_strings(value, &mut |s| {
        if is_temp_id(s) {
            found.insert(s.to_owned());
        }
    });
    found.into_iter().collect()
}

fn walk_strings<F: FnMut(&str)>(value: &Value, visit: &mut F) {
    match value {
        Value::String(s) => visit(s),
        Value::Array(items) => {
            for item in items {
                walk_strings(item, visit);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                walk_strings(item, visit);
            }
        }
        _ => {}
    }
}
