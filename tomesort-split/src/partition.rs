//! Grouping records by declared source
//!
//! Records without a `source` field are quarantined, never written to any
//! partition and never silently dropped from the report. Grouping is
//! stable and keeps duplicates; deduplication is a separate, explicit
//! step.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::warn;

use tomesort_common::records::{record_name, record_source};

/// One category's records grouped by source, plus the quarantine list.
#[derive(Debug, Default)]
pub struct Grouped {
    /// source id -> records, input order preserved within each source.
    pub by_source: IndexMap<String, Vec<Value>>,
    /// Display names of records that carried no source field.
    pub quarantined: Vec<String>,
}

/// Group one category's records by their `source` field.
pub fn group_by_source(records: Vec<Value>, category: &str) -> Grouped {
    let mut grouped = Grouped::default();

    for record in records {
        match record_source(&record) {
            Some(source) => {
                grouped
                    .by_source
                    .entry(source.to_string())
                    .or_default()
                    .push(record);
            }
            None => {
                grouped
                    .quarantined
                    .push(format!("{}: {}", category, record_name(&record)));
            }
        }
    }

    if !grouped.quarantined.is_empty() {
        warn!(
            "Found {} {} records without source field",
            grouped.quarantined.len(),
            category
        );
    }

    grouped
}

/// Remove duplicate records keyed on (name, source).
///
/// A record carrying a numeric `page` beats one without; when both carry
/// one the larger page wins (reprints supersede earlier printings, as a
/// best-effort heuristic); otherwise the first-encountered record is
/// kept. Records missing name or source pass through untouched.
pub fn deduplicate(records: Vec<Value>) -> Vec<Value> {
    let mut keyed: IndexMap<(String, String), Value> = IndexMap::new();
    let mut unkeyed = Vec::new();

    for record in records {
        let key = match (
            record.get("name").and_then(Value::as_str),
            record_source(&record),
        ) {
            (Some(name), Some(source)) => (name.to_string(), source.to_string()),
            _ => {
                unkeyed.push(record);
                continue;
            }
        };

        match keyed.get(&key) {
            None => {
                keyed.insert(key, record);
            }
            Some(existing) => {
                let new_page = record.get("page").and_then(Value::as_i64);
                let old_page = existing.get("page").and_then(Value::as_i64);
                let replace = match (old_page, new_page) {
                    (None, Some(_)) => true,
                    (Some(old), Some(new)) => new > old,
                    _ => false,
                };
                if replace {
                    keyed.insert(key, record);
                }
            }
        }
    }

    let mut result: Vec<Value> = keyed.into_values().collect();
    result.extend(unkeyed);
    result
}
