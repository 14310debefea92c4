//! Record structure helpers
//!
//! A record file is an object whose top-level keys are entity-array
//! categories (`spell`, `monster`, ...) plus bookkeeping keys prefixed
//! with `_` (`_meta`). Records themselves are arbitrarily nested objects;
//! only `name` and `source` matter for attribution.

use serde_json::Value;

/// Record's declared source, if any.
pub fn record_source(record: &Value) -> Option<&str> {
    record.get("source").and_then(Value::as_str)
}

/// Record's display name for log and report lines.
pub fn record_name(record: &Value) -> &str {
    record
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("Unknown")
}

/// (category, records) pairs extracted from one record file.
///
/// Keys starting with `_` are bookkeeping, not categories. When
/// `categories` is given, unknown keys are skipped; otherwise every array
/// of objects counts (fluff files carry ad-hoc keys).
pub fn extract_entity_arrays(
    data: &Value,
    categories: Option<&[&str]>,
) -> Vec<(String, Vec<Value>)> {
    let Some(object) = data.as_object() else {
        return Vec::new();
    };

    let mut arrays = Vec::new();
    for (key, value) in object {
        if key.starts_with('_') {
            continue;
        }
        if let Some(allowed) = categories {
            if !allowed.contains(&key.as_str()) {
                continue;
            }
        }
        let Some(items) = value.as_array() else {
            continue;
        };
        if items.is_empty() || !items[0].is_object() {
            continue;
        }
        arrays.push((key.clone(), items.clone()));
    }

    arrays
}
