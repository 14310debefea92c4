//! Textual reference extraction
//!
//! Record prose embeds `{@kind payload}` markup. Only a closed set of
//! kinds are entity references; the rest (dice expressions, formatting
//! directives) share the syntax and are not reported at all. The walk
//! returns a flat occurrence list; classification happens elsewhere.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::occurrence::{Location, TagOccurrence};

/// Markup pattern: `{@kind payload}`.
static TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{@(\w+)\s+([^}]*)\}").expect("tag pattern compiles"));

/// Tag kinds that reference indexed entities.
static ENTITY_TAG_KINDS: &[&str] = &[
    "spell",
    "item",
    "creature",
    "feat",
    "race",
    "background",
    "deity",
    "class",
    "subclass",
    "condition",
    "disease",
    "skill",
    "language",
    "cult",
    "boon",
    "object",
    "vehicle",
    "optionalfeature",
    "variantrule",
    "charoption",
    "card",
    "group",
    "recipe",
    "reward",
    "sense",
    "trap",
    "hazard",
    "creatureTemplate",
];

/// Nesting deeper than this stops the walk on that branch. Real records
/// never get close; a cyclic structure must not hang the audit.
const MAX_SCAN_DEPTH: usize = 100;

/// Whether a tag kind names an entity reference.
pub fn is_entity_tag(kind: &str) -> bool {
    ENTITY_TAG_KINDS.contains(&kind)
}

/// Extract every entity-tag occurrence from one record.
pub fn scan_tags(record: &Value, location: &Location) -> Vec<TagOccurrence> {
    let mut occurrences = Vec::new();
    walk(record, location, 0, &mut occurrences);
    occurrences
}

fn walk(value: &Value, location: &Location, depth: usize, out: &mut Vec<TagOccurrence>) {
    if depth > MAX_SCAN_DEPTH {
        return;
    }

    match value {
        Value::String(text) => extract_from_text(text, location, out),
        Value::Object(map) => {
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

fn extract_from_text(text: &str, location: &Location, out: &mut Vec<TagOccurrence>) {
    for captures in TAG_PATTERN.captures_iter(text) {
        let kind = &captures[1];
        if !is_entity_tag(kind) {
            continue;
        }

        // Payload is name|source|display...; only the first two matter.
        let payload = &captures[2];
        let mut parts = payload.split('|');
        let name = parts.next().unwrap_or("").trim().to_lowercase();
        if name.is_empty() {
            continue;
        }
        let source = parts
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        out.push(TagOccurrence {
            raw: captures[0].to_string(),
            kind: kind.to_string(),
            name,
            source,
            location: location.clone(),
        });
    }
}
