//! Path-convention configuration
//!
//! The asset tree predates the source-based layout, and a handful of
//! sources never matched their own folder names inside asset paths. Those
//! divergences are design decisions carried by the corpus, not bugs, so
//! they live here as versioned data: a compiled-in override table that an
//! optional TOML file can replace at startup. The table is built once and
//! read-only afterward.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::{Error, Result};

/// Alternate path components for sources whose asset paths diverge from
/// their canonical identifier.
///
/// Three kinds of divergence exist:
/// - abbreviated forms (`PS-A` folders, `book/PSA/...` asset paths);
/// - renamed directories (`HAT-TG` assets live under `TG/`);
/// - submodule sources whose assets nest under a base directory
///   (`TftYP-AtG` assets live under `TftYP/AtG/`).
///
/// Every key must name a source that exists in the canonical catalog;
/// this is a property of the shipped data, not checked at runtime.
#[derive(Debug, Clone)]
pub struct PathOverrides {
    components: BTreeMap<String, String>,
    /// Hyphenated source ids that are standalone publications, not
    /// base/sub pairs, and must never be decomposed on the separator.
    independent: HashSet<String>,
    /// Directory renames to probe when an asset is not at its declared
    /// location (old directory name still on disk).
    legacy_dirs: BTreeMap<String, String>,
}

/// On-disk TOML shape for a replacement override table.
#[derive(Debug, Deserialize)]
struct OverridesFile {
    #[serde(default)]
    path_components: BTreeMap<String, String>,
    #[serde(default)]
    independent_sources: Vec<String>,
    #[serde(default)]
    legacy_directories: BTreeMap<String, String>,
}

static BUILTIN: Lazy<PathOverrides> = Lazy::new(PathOverrides::builtin_table);

impl PathOverrides {
    /// The compiled-in table shipped with this version of the tools.
    pub fn builtin() -> &'static PathOverrides {
        &BUILTIN
    }

    /// Load a replacement table from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: OverridesFile = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

        Ok(Self {
            components: file.path_components,
            independent: file.independent_sources.into_iter().collect(),
            legacy_dirs: file.legacy_directories,
        })
    }

    /// Normalized asset-path component for a source: the override value
    /// if one exists, the source id unchanged otherwise.
    pub fn normalize<'a>(&'a self, source: &'a str) -> &'a str {
        self.components
            .get(source)
            .map(String::as_str)
            .unwrap_or(source)
    }

    /// Whether the table carries an override for this source.
    pub fn contains(&self, source: &str) -> bool {
        self.components.contains_key(source)
    }

    /// Whether a hyphenated source id is a standalone publication that
    /// must not be split into a base/sub pair.
    pub fn is_independent(&self, source: &str) -> bool {
        self.independent.contains(source)
    }

    /// Old directory name to probe for a source whose asset directory
    /// was renamed at some point.
    pub fn legacy_dir(&self, source: &str) -> Option<&str> {
        self.legacy_dirs.get(source).map(String::as_str)
    }

    fn builtin_table() -> Self {
        let mut components = BTreeMap::new();

        // Plane Shift sources use abbreviated forms in asset paths:
        // folder PS-A, asset paths book/PSA/...
        for (id, short) in [
            ("PS-A", "PSA"),
            ("PS-I", "PSI"),
            ("PS-D", "PSD"),
            ("PS-K", "PSK"),
            ("PS-X", "PSX"),
            ("PS-Z", "PSZ"),
        ] {
            components.insert(id.to_string(), short.to_string());
        }

        // HAT-TG kept its pre-rename directory name in asset paths.
        components.insert("HAT-TG".to_string(), "TG".to_string());

        // Submodule sources nest under their base directory.
        for (id, nested) in [
            ("AitFR-AVT", "AitFR/AVT"),
            ("AitFR-DN", "AitFR/DN"),
            ("AitFR-FCD", "AitFR/FCD"),
            ("AitFR-ISF", "AitFR/ISF"),
            ("AitFR-THP", "AitFR/THP"),
            ("MCV1SC", "MCV/1SC"),
            ("MCV2DC", "MCV/2DC"),
            ("MCV3MC", "MCV/3MC"),
            ("MCV4EC", "MCV/4EC"),
            ("TftYP-AtG", "TftYP/AtG"),
            ("TftYP-DiT", "TftYP/DiT"),
            ("TftYP-TFoF", "TftYP/TFoF"),
            ("TftYP-THSoT", "TftYP/THSoT"),
            ("TftYP-TSC", "TftYP/TSC"),
            ("TftYP-ToH", "TftYP/ToH"),
            ("TftYP-WPM", "TftYP/WPM"),
            ("NRH-ASS", "NRH/ASS"),
            ("NRH-AT", "NRH/AT"),
            ("NRH-AVitW", "NRH/AVitW"),
            ("NRH-AWoL", "NRH/AWoL"),
            ("NRH-CoI", "NRH/CoI"),
            ("NRH-TCMC", "NRH/TCMC"),
            ("NRH-TLT", "NRH/TLT"),
            ("HAT-LMI", "HAT/LMI"),
        ] {
            components.insert(id.to_string(), nested.to_string());
        }

        let independent = [
            "PS-A", "PS-D", "PS-I", "PS-K", "PS-X", "PS-Z", "HAT-TG",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let mut legacy_dirs = BTreeMap::new();
        legacy_dirs.insert("HAT-TG".to_string(), "TG".to_string());

        Self {
            components,
            independent,
            legacy_dirs,
        }
    }
}

impl Default for PathOverrides {
    fn default() -> Self {
        PathOverrides::builtin().clone()
    }
}

/// Which files and directories the partitioner ignores.
#[derive(Debug, Clone)]
pub struct SkipRules {
    files: HashSet<String>,
    patterns: Vec<String>,
    dirs: HashSet<String>,
}

impl SkipRules {
    /// Whether a record file is excluded from partitioning (catalog and
    /// tooling files, or a name matching a skip pattern).
    pub fn should_skip_file(&self, filename: &str) -> bool {
        if self.files.contains(filename) {
            return true;
        }
        self.patterns.iter().any(|p| wildcard_match(p, filename))
    }

    /// Whether a directory is excluded from traversal.
    pub fn should_skip_dir(&self, dirname: &str) -> bool {
        self.dirs.contains(dirname)
    }
}

impl Default for SkipRules {
    fn default() -> Self {
        Self {
            files: ["books.json", "changelog.json", "converter.json"]
                .into_iter()
                .map(String::from)
                .collect(),
            patterns: vec!["foundry-*.json".to_string()],
            dirs: ["generated", ".git", "node_modules"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Single-`*` wildcard match, enough for the skip patterns we ship.
fn wildcard_match(pattern: &str, name: &str) -> bool {
    match pattern.split_once('*') {
        Some((prefix, suffix)) => {
            name.len() >= prefix.len() + suffix.len()
                && name.starts_with(prefix)
                && name.ends_with(suffix)
        }
        None => pattern == name,
    }
}

/// Asset categories present in the asset tree.
pub static IMAGE_CATEGORIES: &[&str] = &[
    "adventure",
    "backgrounds",
    "bestiary",
    "book",
    "classes",
    "deities",
    "decks",
    "items",
    "races",
    "spells",
    "vehicles",
    "objects",
    "hazards",
    "trapshazards",
];

/// Record-array keys the partitioner processes.
pub static ENTITY_TYPES: &[&str] = &[
    "action",
    "adventure",
    "background",
    "book",
    "boon",
    "card",
    "charoption",
    "class",
    "condition",
    "cult",
    "deity",
    "disease",
    "feat",
    "group",
    "hazard",
    "item",
    "language",
    "monster",
    "object",
    "optionalfeature",
    "psionic",
    "race",
    "recipe",
    "reward",
    "sense",
    "skill",
    "spell",
    "subclass",
    "trap",
    "variantrule",
    "vehicle",
];

/// Default number of concrete examples retained per outcome class in
/// reports.
pub const DEFAULT_SAMPLE_LIMIT: usize = 5;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn normalize_is_identity_outside_table() {
        let overrides = PathOverrides::builtin();
        assert_eq!(overrides.normalize("PHB"), "PHB");
        assert_eq!(overrides.normalize("MM"), "MM");
    }

    #[test]
    fn normalize_applies_overrides() {
        let overrides = PathOverrides::builtin();
        assert_eq!(overrides.normalize("PS-A"), "PSA");
        assert_eq!(overrides.normalize("HAT-TG"), "TG");
        assert_eq!(overrides.normalize("TftYP-AtG"), "TftYP/AtG");
    }

    #[test]
    fn plane_shift_sources_are_independent() {
        let overrides = PathOverrides::builtin();
        assert!(overrides.is_independent("PS-A"));
        assert!(overrides.is_independent("HAT-TG"));
        assert!(!overrides.is_independent("TftYP-AtG"));
    }

    #[test]
    fn toml_file_replaces_builtin_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
independent_sources = ["XY-Z"]

[path_components]
"XY-Z" = "XYZ"

[legacy_directories]
"XY-Z" = "Z"
"#
        )
        .unwrap();

        let overrides = PathOverrides::from_toml_file(file.path()).unwrap();
        assert_eq!(overrides.normalize("XY-Z"), "XYZ");
        assert_eq!(overrides.normalize("PS-A"), "PS-A");
        assert!(overrides.is_independent("XY-Z"));
        assert_eq!(overrides.legacy_dir("XY-Z"), Some("Z"));
    }

    #[test]
    fn skip_rules_match_patterns() {
        let rules = SkipRules::default();
        assert!(rules.should_skip_file("books.json"));
        assert!(rules.should_skip_file("foundry-items.json"));
        assert!(!rules.should_skip_file("items.json"));
        assert!(rules.should_skip_dir("generated"));
        assert!(!rules.should_skip_dir("bestiary"));
    }
}
