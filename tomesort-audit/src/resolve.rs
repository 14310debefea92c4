//! Asset path resolution
//!
//! Asset paths have the shape `category/pathSource/...rest`. Three naming
//! conventions collide here: the record's `source` field, the partition
//! directory name, and the path component inside the asset tree. The
//! override table reconciles them; everything this module reports as a
//! mismatch survived that reconciliation.
//!
//! Existence probes are the only hot-path I/O in the audit, so directory
//! listings are cached: one `read_dir` per probed directory per run.

use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

use tomesort_common::config::PathOverrides;

/// Asset-path resolution data errors.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Too few segments to carry a category and a source component.
    #[error("Malformed asset path '{0}': expected category/source/...")]
    MalformedPath(String),
}

/// Cached existence probes, one directory listing per directory.
#[derive(Debug, Default)]
struct DirCache {
    listings: Mutex<HashMap<PathBuf, Option<HashSet<OsString>>>>,
}

impl DirCache {
    fn exists(&self, path: &Path) -> bool {
        let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
            return path.exists();
        };

        let mut listings = match self.listings.lock() {
            Ok(guard) => guard,
            // A poisoned cache only costs a re-listing.
            Err(poisoned) => poisoned.into_inner(),
        };

        let listing = listings
            .entry(parent.to_path_buf())
            .or_insert_with(|| read_listing(parent));

        match listing {
            Some(names) => names.contains(name),
            None => false,
        }
    }
}

fn read_listing(dir: &Path) -> Option<HashSet<OsString>> {
    let entries = std::fs::read_dir(dir).ok()?;
    Some(entries.filter_map(|e| e.ok()).map(|e| e.file_name()).collect())
}

/// Resolves asset references against the asset tree.
#[derive(Debug)]
pub struct AssetResolver {
    img_root: PathBuf,
    overrides: PathOverrides,
    cache: DirCache,
}

impl AssetResolver {
    pub fn new(img_root: PathBuf, overrides: PathOverrides) -> Self {
        Self {
            img_root,
            overrides,
            cache: DirCache::default(),
        }
    }

    pub fn overrides(&self) -> &PathOverrides {
        &self.overrides
    }

    pub fn img_root(&self) -> &Path {
        &self.img_root
    }

    /// Normalized asset-path component for a source.
    pub fn normalize<'a>(&'a self, source: &'a str) -> &'a str {
        self.overrides.normalize(source)
    }

    /// Location the asset should occupy if it belongs to `source`.
    ///
    /// None when the path's embedded source component differs from the
    /// source's normalized component: the asset belongs to another
    /// source's partition (a cross-source reference, not an error).
    pub fn expected_path(
        &self,
        source: &str,
        asset_path: &str,
    ) -> Result<Option<PathBuf>, ResolveError> {
        let (category, rest) = split_asset_path(asset_path)?;

        let normalized = self.overrides.normalize(source);
        if !embedded_component_matches(rest, normalized) {
            return Ok(None);
        }

        Ok(Some(self.img_root.join(category).join(rest)))
    }

    /// Location where the asset actually exists, if anywhere.
    ///
    /// Probes in order: the path as written; the path with the source's
    /// normalized component substituted; the source's legacy directory
    /// name. First hit wins.
    pub fn actual_path(
        &self,
        source: &str,
        asset_path: &str,
    ) -> Result<Option<PathBuf>, ResolveError> {
        let (category, rest) = split_asset_path(asset_path)?;
        let (path_source, subpath) = match rest.split_once('/') {
            Some((first, tail)) => (first, Some(tail)),
            None => (rest, None),
        };

        // 1. The path exactly as written.
        let direct = self.img_root.join(category).join(rest);
        if self.cache.exists(&direct) {
            return Ok(Some(direct));
        }

        // 2. The source's normalized component in place of the embedded one.
        let normalized = self.overrides.normalize(source);
        if normalized != path_source {
            let mut candidate = self.img_root.join(category).join(normalized);
            if let Some(subpath) = subpath {
                candidate = candidate.join(subpath);
            }
            if candidate != direct && self.cache.exists(&candidate) {
                return Ok(Some(candidate));
            }
        }

        // 3. Historical exceptions: directories that migrated names.
        if let Some(legacy) = self.overrides.legacy_dir(source) {
            if legacy != path_source && legacy != normalized {
                let mut candidate = self.img_root.join(category).join(legacy);
                if let Some(subpath) = subpath {
                    candidate = candidate.join(subpath);
                }
                if self.cache.exists(&candidate) {
                    return Ok(Some(candidate));
                }
            }
        }

        Ok(None)
    }
}

/// Split `category/rest`; malformed when either half is missing.
fn split_asset_path(asset_path: &str) -> Result<(&str, &str), ResolveError> {
    match asset_path.split_once('/') {
        Some((category, rest)) if !category.is_empty() && !rest.is_empty() => {
            Ok((category, rest))
        }
        _ => Err(ResolveError::MalformedPath(asset_path.to_string())),
    }
}

/// Whether `rest` starts with the normalized source component. Handles
/// multi-segment components (`TftYP/AtG`) as well as single ones.
fn embedded_component_matches(rest: &str, normalized: &str) -> bool {
    rest == normalized
        || rest
            .strip_prefix(normalized)
            .map(|tail| tail.starts_with('/'))
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"img").unwrap();
    }

    fn resolver(img_root: &Path) -> AssetResolver {
        AssetResolver::new(img_root.to_path_buf(), PathOverrides::builtin().clone())
    }

    #[test]
    fn expected_path_for_matching_source() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver(dir.path());

        let expected = resolver.expected_path("PHB", "items/PHB/Sword.webp").unwrap();
        assert_eq!(expected, Some(dir.path().join("items/PHB/Sword.webp")));
    }

    #[test]
    fn expected_path_none_for_foreign_source() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver(dir.path());

        // Embedded MM differs from DMG: cross-source, not an error.
        let expected = resolver
            .expected_path("DMG", "bestiary/MM/Goblin.webp")
            .unwrap();
        assert_eq!(expected, None);
    }

    #[test]
    fn expected_path_uses_normalized_component() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver(dir.path());

        // PS-A normalizes to PSA, so book/PSA/... is its own path.
        let expected = resolver.expected_path("PS-A", "book/PSA/001.webp").unwrap();
        assert_eq!(expected, Some(dir.path().join("book/PSA/001.webp")));

        // And the un-normalized spelling is not.
        let expected = resolver.expected_path("PS-A", "book/PS-A/001.webp").unwrap();
        assert_eq!(expected, None);
    }

    #[test]
    fn expected_path_handles_nested_components() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver(dir.path());

        let expected = resolver
            .expected_path("TftYP-AtG", "adventure/TftYP/AtG/005.webp")
            .unwrap();
        assert_eq!(
            expected,
            Some(dir.path().join("adventure/TftYP/AtG/005.webp"))
        );
    }

    #[test]
    fn malformed_paths_are_data_errors() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver(dir.path());

        assert!(resolver.expected_path("PHB", "Sword.webp").is_err());
        assert!(resolver.actual_path("PHB", "justonesegment").is_err());
        assert!(resolver.expected_path("PHB", "items/").is_err());
    }

    #[test]
    fn actual_path_prefers_the_path_as_written() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("items/PHB/Sword.webp"));
        let resolver = resolver(dir.path());

        let actual = resolver.actual_path("PHB", "items/PHB/Sword.webp").unwrap();
        assert_eq!(actual, Some(dir.path().join("items/PHB/Sword.webp")));
    }

    #[test]
    fn actual_path_falls_back_to_normalized_component() {
        let dir = tempfile::tempdir().unwrap();
        // Asset lives under the normalized PSA directory, but the record
        // wrote the canonical id into the path.
        touch(&dir.path().join("book/PSA/001.webp"));
        let resolver = resolver(dir.path());

        let actual = resolver.actual_path("PS-A", "book/PS-A/001.webp").unwrap();
        assert_eq!(actual, Some(dir.path().join("book/PSA/001.webp")));
    }

    #[test]
    fn actual_path_probes_legacy_directories() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("book/TG/001.webp"));

        let mut overrides_file = tempfile::NamedTempFile::new().unwrap();
        use std::io::Write;
        writeln!(
            overrides_file,
            r#"
[path_components]
"HAT-TG" = "HATTG"

[legacy_directories]
"HAT-TG" = "TG"
"#
        )
        .unwrap();
        let overrides = PathOverrides::from_toml_file(overrides_file.path()).unwrap();
        let resolver = AssetResolver::new(dir.path().to_path_buf(), overrides);

        let actual = resolver.actual_path("HAT-TG", "book/HAT-TG/001.webp").unwrap();
        assert_eq!(actual, Some(dir.path().join("book/TG/001.webp")));
    }

    #[test]
    fn actual_path_none_when_absent_everywhere() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver(dir.path());

        let actual = resolver.actual_path("PHB", "items/PHB/Sword.webp").unwrap();
        assert_eq!(actual, None);
    }

    #[test]
    fn directory_listings_are_cached() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("items/PHB/Sword.webp"));
        let resolver = resolver(dir.path());

        assert!(resolver
            .actual_path("PHB", "items/PHB/Sword.webp")
            .unwrap()
            .is_some());

        // A file created after the first listing is invisible: the cache
        // holds for the whole run.
        touch(&dir.path().join("items/PHB/Shield.webp"));
        assert!(resolver
            .actual_path("PHB", "items/PHB/Shield.webp")
            .unwrap()
            .is_none());
    }
}
