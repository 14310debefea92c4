//! Orphaned-asset detection
//!
//! Assets on disk that no record references. Orphans are warnings: the
//! re-partitioning never deletes assets, so an orphan costs disk space,
//! not correctness.

use std::collections::HashSet;
use std::path::Path;

use walkdir::WalkDir;

use tomesort_common::config::IMAGE_CATEGORIES;
use tomesort_common::fsops::is_raster_image;

/// Assets under the tree never mentioned by any record, sorted.
///
/// `referenced` holds asset paths exactly as written in records
/// (`category/source/...`); comparison is by that relative form.
pub fn find_orphans(img_root: &Path, referenced: &HashSet<String>) -> Vec<String> {
    let mut orphans = Vec::new();

    for category in IMAGE_CATEGORIES {
        let category_dir = img_root.join(category);
        if !category_dir.is_dir() {
            continue;
        }

        for entry in WalkDir::new(&category_dir).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() || !is_raster_image(entry.path()) {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(img_root) else {
                continue;
            };
            let rel = rel.to_string_lossy().replace('\\', "/");
            if !referenced.contains(&rel) {
                orphans.push(rel);
            }
        }
    }

    orphans.sort();
    orphans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"img").unwrap();
    }

    #[test]
    fn unreferenced_assets_are_orphans() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("items/PHB/Sword.webp"));
        touch(&dir.path().join("items/PHB/Forgotten.webp"));
        touch(&dir.path().join("items/PHB/readme.txt")); // not an asset

        let referenced: HashSet<String> = ["items/PHB/Sword.webp".to_string()].into();
        let orphans = find_orphans(dir.path(), &referenced);
        assert_eq!(orphans, vec!["items/PHB/Forgotten.webp".to_string()]);
    }

    #[test]
    fn fully_referenced_tree_has_no_orphans() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("bestiary/MM/Goblin.webp"));

        let referenced: HashSet<String> = ["bestiary/MM/Goblin.webp".to_string()].into();
        assert!(find_orphans(dir.path(), &referenced).is_empty());
    }
}
