//! Source purity
//!
//! The single most important property of a partitioned corpus: every
//! record under partition S carries `source == S`. Nested entity arrays
//! are checked too; prose `entries` arrays are not entity lists and are
//! excluded from recursion.

use serde_json::Value;
use serde::Serialize;

use crate::corpus::RecordFile;

/// Keys whose array values are prose blocks, not nested entity lists.
static NON_ENTITY_ARRAY_KEYS: &[&str] = &["entries"];

const MAX_DEPTH: usize = 100;

/// One record attributed to the wrong partition.
#[derive(Debug, Clone, Serialize)]
pub struct PurityViolation {
    pub file: String,
    pub json_path: String,
    pub record: String,
    pub expected_source: String,
    pub actual_source: String,
}

/// Check one loaded file against its partition's source.
pub fn check_file(file: &RecordFile) -> Vec<PurityViolation> {
    let mut violations = Vec::new();
    for (category, records) in &file.arrays {
        check_records(
            records,
            &file.source,
            &file.rel_path,
            category,
            0,
            &mut violations,
        );
    }
    violations
}

fn check_records(
    records: &[Value],
    expected: &str,
    file: &str,
    json_path: &str,
    depth: usize,
    out: &mut Vec<PurityViolation>,
) {
    if depth > MAX_DEPTH {
        return;
    }

    for record in records {
        let Some(object) = record.as_object() else {
            continue;
        };

        if let Some(actual) = object.get("source").and_then(Value::as_str) {
            if actual != expected {
                out.push(PurityViolation {
                    file: file.to_string(),
                    json_path: json_path.to_string(),
                    record: object
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or("Unknown")
                        .to_string(),
                    expected_source: expected.to_string(),
                    actual_source: actual.to_string(),
                });
            }
        }

        // Nested entity arrays inherit the expectation.
        for (key, value) in object {
            if NON_ENTITY_ARRAY_KEYS.contains(&key.as_str()) {
                continue;
            }
            if let Some(items) = value.as_array() {
                if items.iter().any(Value::is_object) {
                    let nested_path = format!("{json_path}.{key}");
                    check_records(items, expected, file, &nested_path, depth + 1, out);
                }
            }
        }
    }
}
