//! Per-source asset copying
//!
//! Each source partition receives its cover image plus the per-category
//! asset subtrees that belong to it. Asset directories are named by the
//! source's normalized path component, which is where the override table
//! matters: `PS-A` records pull their assets from `book/PSA/`.
//! Cross-source references are left alone; the audit classifies them.

use std::path::Path;

use tracing::{debug, info};
use walkdir::WalkDir;

use tomesort_common::config::{PathOverrides, IMAGE_CATEGORIES};
use tomesort_common::fsops::{copy_file, is_raster_image};

use crate::stats::SplitStats;

/// Copy all assets belonging to one source into its partition.
///
/// Returns the number of files copied. Individual copy failures are data
/// errors: recorded and skipped.
pub fn copy_source_images(
    source_id: &str,
    img_dir: &Path,
    out_dir: &Path,
    overrides: &PathOverrides,
    stats: &mut SplitStats,
) -> usize {
    debug!("Copying images for {}...", source_id);
    let mut copied = 0;

    // Cover image: img/covers/<SOURCE>.webp
    let cover = img_dir.join("covers").join(format!("{source_id}.webp"));
    if cover.exists() {
        let dst = out_dir
            .join(source_id)
            .join("img/covers")
            .join(format!("{source_id}.webp"));
        match copy_file(&cover, &dst) {
            Ok(_) => {
                copied += 1;
                stats.add_image_count(source_id, "covers", 1);
            }
            Err(e) => stats.add_error(format!("Failed to copy cover for {source_id}: {e}")),
        }
    } else {
        debug!("  Cover image not found: {}", cover.display());
    }

    // Category subtrees: img/<category>/<normalized>/**
    let component = overrides.normalize(source_id);
    for category in IMAGE_CATEGORIES {
        let src_root = img_dir.join(category).join(component);
        if !src_root.is_dir() {
            continue;
        }

        let dst_root = out_dir
            .join(source_id)
            .join("img")
            .join(category)
            .join(component);

        let mut category_count = 0;
        for entry in WalkDir::new(&src_root).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() || !is_raster_image(entry.path()) {
                continue;
            }
            // Paths under src_root stay relative inside the partition.
            let rel = match entry.path().strip_prefix(&src_root) {
                Ok(rel) => rel,
                Err(_) => continue,
            };
            match copy_file(entry.path(), &dst_root.join(rel)) {
                Ok(_) => category_count += 1,
                Err(e) => stats.add_error(format!(
                    "Failed to copy {} for {}: {}",
                    entry.path().display(),
                    source_id,
                    e
                )),
            }
        }

        if category_count > 0 {
            debug!("    Copied {} {} images", category_count, category);
            stats.add_image_count(source_id, category, category_count);
            copied += category_count;
        }
    }

    if copied > 0 {
        info!("  Copied {} images for {}", copied, source_id);
    }
    copied
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"img").unwrap();
    }

    #[test]
    fn copies_cover_and_category_tree() {
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("img");
        let out = dir.path().join("out");
        touch(&img.join("covers/PHB.webp"));
        touch(&img.join("items/PHB/Sword.webp"));
        touch(&img.join("items/PHB/deep/Shield.webp"));
        touch(&img.join("items/PHB/notes.txt")); // not a raster image

        let mut stats = SplitStats::default();
        let copied =
            copy_source_images("PHB", &img, &out, PathOverrides::builtin(), &mut stats);

        assert_eq!(copied, 3);
        assert!(out.join("PHB/img/covers/PHB.webp").exists());
        assert!(out.join("PHB/img/items/PHB/Sword.webp").exists());
        assert!(out.join("PHB/img/items/PHB/deep/Shield.webp").exists());
        assert!(!out.join("PHB/img/items/PHB/notes.txt").exists());
    }

    #[test]
    fn normalized_component_locates_override_sources() {
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("img");
        let out = dir.path().join("out");
        // PS-A assets live under the abbreviated PSA directory.
        touch(&img.join("book/PSA/001.webp"));

        let mut stats = SplitStats::default();
        let copied =
            copy_source_images("PS-A", &img, &out, PathOverrides::builtin(), &mut stats);

        assert_eq!(copied, 1);
        assert!(out.join("PS-A/img/book/PSA/001.webp").exists());
    }

    #[test]
    fn other_sources_assets_are_not_copied() {
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("img");
        let out = dir.path().join("out");
        touch(&img.join("bestiary/MM/Goblin.webp"));

        let mut stats = SplitStats::default();
        let copied =
            copy_source_images("DMG", &img, &out, PathOverrides::builtin(), &mut stats);

        assert_eq!(copied, 0);
        assert!(!out.join("DMG/img/bestiary/MM/Goblin.webp").exists());
    }
}
