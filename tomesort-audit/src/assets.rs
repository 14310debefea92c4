//! Image-asset reference extraction
//!
//! Image references are objects with `"type": "image"` and a nested
//! `href` carrying a `path` for internally-hosted assets. URL-hosted
//! references are out of scope for path resolution and skipped entirely.

use serde_json::Value;

use crate::occurrence::{AssetOccurrence, Location};

const MAX_SCAN_DEPTH: usize = 100;

/// Extract every internally-hosted image reference from one record.
pub fn scan_assets(record: &Value, location: &Location) -> Vec<AssetOccurrence> {
    let mut occurrences = Vec::new();
    walk(record, location, 0, &mut occurrences);
    occurrences
}

fn walk(value: &Value, location: &Location, depth: usize, out: &mut Vec<AssetOccurrence>) {
    if depth > MAX_SCAN_DEPTH {
        return;
    }

    match value {
        Value::Object(map) => {
            if map.get("type").and_then(Value::as_str) == Some("image") {
                if let Some(path) = internal_href_path(map.get("href")) {
                    let category = path.split('/').next().unwrap_or("unknown").to_string();
                    out.push(AssetOccurrence {
                        path: path.to_string(),
                        category,
                        location: location.clone(),
                    });
                }
            }
            for child in map.values() {
                walk(child, location, depth + 1, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, location, depth + 1, out);
            }
        }
        _ => {}
    }
}

/// Path from an `href` object, unless it is externally hosted.
fn internal_href_path(href: Option<&Value>) -> Option<&str> {
    let href = href?.as_object()?;
    if href.get("type").and_then(Value::as_str) == Some("external") {
        return None;
    }
    href.get("path").and_then(Value::as_str).filter(|p| !p.is_empty())
}
