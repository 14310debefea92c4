//! Record index
//!
//! In-memory index of every record by (category, source), with a reverse
//! lookup by (category, lowercased name). Duplicate names are legal
//! (reprints), so the reverse lookup keeps lists, not single values. The
//! index is built completely before any classification starts and is
//! read-only afterward.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::Value;

use tomesort_common::records::record_source;

/// Tag kinds whose name differs from the indexed category key.
static CATEGORY_ALIASES: &[(&str, &str)] = &[("creature", "monster"), ("creatureTemplate", "monsterTemplate")];

/// One indexed record.
#[derive(Debug, Clone)]
pub struct IndexedEntity {
    pub name: String,
    pub source: String,
    /// Record file the entity came from, relative to the corpus root.
    pub file: String,
    pub record: Value,
}

/// Index of all records by category, source, and lowercased name.
#[derive(Debug, Default)]
pub struct EntityIndex {
    entities: Vec<IndexedEntity>,
    /// category -> source -> entity ids, both levels in insertion order.
    by_category: IndexMap<String, IndexMap<String, Vec<usize>>>,
    /// (category, lowercased name) -> entity ids in insertion order.
    by_name: HashMap<(String, String), Vec<usize>>,
}

impl EntityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest one category's records from one file.
    ///
    /// Records missing a name or source cannot be referenced and are not
    /// indexed (the partitioner reports them; the index just skips them).
    pub fn insert_all(&mut self, category: &str, records: &[Value], file: &str) {
        for record in records {
            let Some(source) = record_source(record) else {
                continue;
            };
            let Some(name) = record.get("name").and_then(Value::as_str) else {
                continue;
            };

            let id = self.entities.len();
            self.entities.push(IndexedEntity {
                name: name.to_string(),
                source: source.to_string(),
                file: file.to_string(),
                record: record.clone(),
            });

            self.by_category
                .entry(category.to_string())
                .or_default()
                .entry(source.to_string())
                .or_default()
                .push(id);

            self.by_name
                .entry((category.to_string(), name.to_lowercase()))
                .or_default()
                .push(id);
        }
    }

    /// Look up a record by category and lowercased name.
    ///
    /// With a source, the first entry whose source matches
    /// case-insensitively wins. Without one, the first entry in insertion
    /// order wins; when the same name exists in several sources, which
    /// duplicate that is depends on load order. That ambiguity is part of
    /// the corpus, not resolved here.
    pub fn find(&self, category: &str, name: &str, source: Option<&str>) -> Option<&IndexedEntity> {
        let ids = self
            .by_name
            .get(&(category.to_string(), name.to_lowercase()))?;

        match source {
            Some(wanted) => ids
                .iter()
                .map(|&id| &self.entities[id])
                .find(|e| e.source.eq_ignore_ascii_case(wanted)),
            None => ids.first().map(|&id| &self.entities[id]),
        }
    }

    /// Map a tag kind to an indexed category: alias table first, then the
    /// exact category key, then a substring match against known keys.
    pub fn resolve_category(&self, kind: &str) -> Option<String> {
        for (alias, category) in CATEGORY_ALIASES {
            if kind == *alias {
                return self
                    .by_category
                    .contains_key(*category)
                    .then(|| category.to_string());
            }
        }

        if self.by_category.contains_key(kind) {
            return Some(kind.to_string());
        }

        let lowered = kind.to_lowercase();
        self.by_category
            .keys()
            .find(|cat| {
                let cat_lower = cat.to_lowercase();
                cat_lower.contains(&lowered) || lowered.contains(&cat_lower)
            })
            .cloned()
    }

    /// Grouping view: source -> records for one category, insertion order.
    pub fn by_source(&self, category: &str) -> IndexMap<&str, Vec<&IndexedEntity>> {
        let mut result = IndexMap::new();
        if let Some(sources) = self.by_category.get(category) {
            for (source, ids) in sources {
                result.insert(
                    source.as_str(),
                    ids.iter().map(|&id| &self.entities[id]).collect(),
                );
            }
        }
        result
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.by_category.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
