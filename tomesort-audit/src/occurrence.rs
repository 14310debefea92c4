//! Reference occurrences
//!
//! A scanner walk produces a flat list of occurrences; classification is
//! a separate pass. Occurrences are transient; after a run only the
//! bounded report samples survive.

/// Where a reference was found.
#[derive(Debug, Clone)]
pub struct Location {
    /// Partition the referencing record belongs to.
    pub source: String,
    /// Record file, relative to the corpus root.
    pub file: String,
    /// Referencing record's display name.
    pub record: String,
}

impl Location {
    pub fn describe(&self) -> String {
        format!("{} ({}) in {}", self.record, self.source, self.file)
    }
}

/// One `{@kind name|source}` markup occurrence.
#[derive(Debug, Clone)]
pub struct TagOccurrence {
    /// Full matched markup, e.g. `{@spell fireball|PHB}`.
    pub raw: String,
    /// Tag kind, e.g. `spell`.
    pub kind: String,
    /// Target name, lowercased for matching.
    pub name: String,
    /// Explicitly requested source, when the payload carried one.
    pub source: Option<String>,
    pub location: Location,
}

/// One internally-hosted image reference.
#[derive(Debug, Clone)]
pub struct AssetOccurrence {
    /// Path as written in the record, e.g. `book/PSA/001.webp`.
    pub path: String,
    /// Asset category, the path's first component.
    pub category: String,
    pub location: Location,
}
