//! Source catalog
//!
//! Canonical publication identifiers come from the corpus book list
//! (`books.json`). Partitioning and auditing both treat this catalog as
//! the authority on which sources exist.

use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::info;

use crate::json_io::load_json;
use crate::{Error, Result};

/// Metadata for one publication source.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub id: String,
    pub name: Option<String>,
    pub group: Option<String>,
}

/// Canonical source identifiers and metadata, in book-list order.
#[derive(Debug, Clone, Default)]
pub struct SourceCatalog {
    sources: IndexMap<String, SourceInfo>,
}

impl SourceCatalog {
    /// Load the catalog from `<data>/books.json`.
    ///
    /// Each entry's identifier comes from its `id` field, falling back to
    /// `source`; entries with neither are skipped.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let books_file = data_dir.join("books.json");
        if !books_file.exists() {
            return Err(Error::Environment(format!(
                "books.json not found at {}",
                books_file.display()
            )));
        }

        let data = load_json(&books_file)?;
        let books = data
            .get("book")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::Config("books.json has no 'book' array".to_string()))?;

        let mut sources = IndexMap::new();
        for book in books {
            let id = book
                .get("id")
                .or_else(|| book.get("source"))
                .and_then(Value::as_str);
            let Some(id) = id else { continue };

            sources.insert(
                id.to_string(),
                SourceInfo {
                    id: id.to_string(),
                    name: book.get("name").and_then(Value::as_str).map(String::from),
                    group: book.get("group").and_then(Value::as_str).map(String::from),
                },
            );
        }

        info!("Loaded {} sources from books.json", sources.len());
        Ok(Self { sources })
    }

    /// Build a catalog from bare identifiers (tests, explicit source lists).
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sources = ids
            .into_iter()
            .map(|id| {
                let id = id.into();
                (
                    id.clone(),
                    SourceInfo {
                        id,
                        name: None,
                        group: None,
                    },
                )
            })
            .collect();
        Self { sources }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&SourceInfo> {
        self.sources.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
