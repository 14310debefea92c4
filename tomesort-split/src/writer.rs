//! Partition writer
//!
//! Splits one category-grouped record file into one file per source under
//! `<out>/<SOURCE>/data/`, preserving the input's `_meta` block, its
//! entity-array keys, and record field order. Multi-file categories merge
//! into an existing output file instead of clobbering it.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use tomesort_common::catalog::SourceCatalog;
use tomesort_common::config::ENTITY_TYPES;
use tomesort_common::json_io::{load_json, save_json};
use tomesort_common::records::extract_entity_arrays;
use tomesort_common::Result;

use crate::partition::{deduplicate, group_by_source};
use crate::stats::SplitStats;

/// Fluff companion files carry ad-hoc entity keys and are split without
/// the category filter.
pub fn is_fluff_file(filename: &str) -> bool {
    filename.starts_with("fluff-") && filename.ends_with(".json")
}

/// Split one record file by source.
///
/// Load or decode failures are data errors: recorded, skipped, never
/// fatal. Records attributed to a source missing from the catalog are
/// skipped with a warning.
pub fn split_file(
    json_path: &Path,
    catalog: &SourceCatalog,
    out_dir: &Path,
    dedup: bool,
    stats: &mut SplitStats,
) -> Result<()> {
    let filename = json_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.json")
        .to_string();
    info!("Processing {}...", filename);

    let data = match load_json(json_path) {
        Ok(data) => data,
        Err(e) => {
            stats.add_error(format!("Failed to load {}: {}", json_path.display(), e));
            return Ok(());
        }
    };

    let categories = if is_fluff_file(&filename) {
        None
    } else {
        Some(ENTITY_TYPES)
    };
    let arrays = extract_entity_arrays(&data, categories);
    if arrays.is_empty() {
        debug!("No entity arrays found in {}", filename);
        return Ok(());
    }

    let meta = data.get("_meta").cloned();

    for (category, records) in arrays {
        debug!("Processing {} {} records...", records.len(), category);

        let records = if dedup { deduplicate(records) } else { records };
        let grouped = group_by_source(records, &category);

        for name in &grouped.quarantined {
            stats.add_quarantined(name.clone());
        }

        for (source_id, source_records) in grouped.by_source {
            if !catalog.contains(&source_id) {
                warn!("Unknown source '{}' in {}, skipping", source_id, filename);
                stats.add_warning(format!("Unknown source '{}' in {}", source_id, filename));
                continue;
            }

            let count = source_records.len();
            let output_file = out_dir.join(&source_id).join("data").join(&filename);
            let output_data = merge_output(&output_file, &category, source_records, meta.as_ref());

            match save_json(&output_file, &output_data) {
                Ok(()) => {
                    stats.add_file_count(&filename, &source_id, count);
                    debug!(
                        "  Saved {} {} records to {}/data/{}",
                        count, category, source_id, filename
                    );
                }
                Err(e) => {
                    stats.add_error(format!("Failed to save {}: {}", output_file.display(), e));
                }
            }
        }
    }

    Ok(())
}

/// Build the output document, extending an existing file's entity array
/// when one is already on disk (multi-file categories land in the same
/// per-source output).
fn merge_output(
    output_file: &Path,
    category: &str,
    records: Vec<Value>,
    meta: Option<&Value>,
) -> Value {
    let mut output = if output_file.exists() {
        match load_json(output_file) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    } else {
        Map::new()
    };

    if let Some(meta) = meta {
        if !output.contains_key("_meta") {
            let mut with_meta = Map::new();
            with_meta.insert("_meta".to_string(), meta.clone());
            with_meta.extend(output);
            output = with_meta;
        }
    }

    match output.get_mut(category).and_then(Value::as_array_mut) {
        Some(existing) => existing.extend(records),
        None => {
            output.insert(category.to_string(), Value::Array(records));
        }
    }

    Value::Object(output)
}
