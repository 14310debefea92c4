//! End-to-end partitioning over a synthetic corpus
//!
//! Builds a category-grouped corpus in a temp directory, runs the split,
//! and checks the source purity of every partition plus the quarantine
//! and dedup behavior.

use std::path::Path;

use serde_json::{json, Value};

use tomesort_common::catalog::SourceCatalog;
use tomesort_common::config::PathOverrides;
use tomesort_common::json_io::{load_json, save_json};
use tomesort_split::images::copy_source_images;
use tomesort_split::stats::SplitStats;
use tomesort_split::writer::split_file;

fn touch(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, b"img").unwrap();
}

#[test]
fn partitions_satisfy_source_purity() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("data/spells.json");
    let out = dir.path().join("data_rework");

    save_json(
        &input,
        &json!({
            "_meta": {"edition": "one"},
            "spell": [
                {"name": "Fireball", "source": "PHB"},
                {"name": "Booming Blade", "source": "TCE"},
                {"name": "Fireball", "source": "XGE"},
                {"name": "Bless", "source": "PHB"}
            ]
        }),
    )
    .unwrap();

    let catalog = SourceCatalog::from_ids(["PHB", "TCE", "XGE"]);
    let mut stats = SplitStats::default();
    split_file(&input, &catalog, &out, false, &mut stats).unwrap();

    // Every record under partition S carries source == S.
    for source in ["PHB", "TCE", "XGE"] {
        let partition = load_json(&out.join(source).join("data/spells.json")).unwrap();
        let records = partition["spell"].as_array().unwrap();
        assert!(!records.is_empty());
        for record in records {
            assert_eq!(
                record["source"], *source,
                "record {:?} leaked into {}",
                record["name"], source
            );
        }
    }

    // Input order preserved within a partition.
    let phb = load_json(&out.join("PHB/data/spells.json")).unwrap();
    let names: Vec<&str> = phb["spell"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Fireball", "Bless"]);
}

#[test]
fn sourceless_record_lands_in_quarantine_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("data/items.json");
    let out = dir.path().join("data_rework");

    save_json(
        &input,
        &json!({"item": [
            {"name": "Sword", "source": "PHB"},
            {"name": "Mystery Object"}
        ]}),
    )
    .unwrap();

    let catalog = SourceCatalog::from_ids(["PHB"]);
    let mut stats = SplitStats::default();
    split_file(&input, &catalog, &out, false, &mut stats).unwrap();

    assert_eq!(stats.quarantined, vec!["item: Mystery Object"]);

    // And it appears in no partition.
    let phb = load_json(&out.join("PHB/data/items.json")).unwrap();
    for record in phb["item"].as_array().unwrap() {
        assert_ne!(record["name"], "Mystery Object");
    }
}

#[test]
fn dedup_keeps_the_paged_reprint() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("data/spells.json");
    let out = dir.path().join("data_rework");

    save_json(
        &input,
        &json!({"spell": [
            {"name": "Fireball", "source": "PHB"},
            {"name": "Fireball", "source": "PHB", "page": 12}
        ]}),
    )
    .unwrap();

    let catalog = SourceCatalog::from_ids(["PHB"]);
    let mut stats = SplitStats::default();
    split_file(&input, &catalog, &out, true, &mut stats).unwrap();

    let phb = load_json(&out.join("PHB/data/spells.json")).unwrap();
    let records = phb["spell"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["page"], 12);
}

#[test]
fn records_are_copied_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("data/spells.json");
    let out = dir.path().join("data_rework");

    let record = json!({
        "name": "Fireball",
        "source": "PHB",
        "level": 3,
        "entries": ["A bright streak flashes...", {"type": "list", "items": ["8d6"]}]
    });
    save_json(&input, &json!({"spell": [record.clone()]})).unwrap();

    let catalog = SourceCatalog::from_ids(["PHB"]);
    let mut stats = SplitStats::default();
    split_file(&input, &catalog, &out, false, &mut stats).unwrap();

    let phb = load_json(&out.join("PHB/data/spells.json")).unwrap();
    assert_eq!(phb["spell"][0], record);
}

#[test]
fn split_and_image_copy_together_build_a_complete_partition() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    let img = dir.path().join("img");
    let out = dir.path().join("data_rework");

    save_json(
        &data.join("books.json"),
        &json!({"book": [{"id": "PS-A", "name": "Plane Shift: Amonkhet"}]}),
    )
    .unwrap();
    save_json(
        &data.join("book.json"),
        &json!({"book": [{"name": "Plane Shift: Amonkhet", "source": "PS-A"}]}),
    )
    .unwrap();
    touch(&img.join("covers/PS-A.webp"));
    touch(&img.join("book/PSA/001.webp"));

    let catalog = SourceCatalog::load(&data).unwrap();
    let mut stats = SplitStats::default();
    split_file(&data.join("book.json"), &catalog, &out, false, &mut stats).unwrap();
    copy_source_images("PS-A", &img, &out, PathOverrides::builtin(), &mut stats);

    assert!(out.join("PS-A/data/book.json").exists());
    assert!(out.join("PS-A/img/covers/PS-A.webp").exists());
    // Assets stay under the normalized component inside the partition.
    assert!(out.join("PS-A/img/book/PSA/001.webp").exists());
    assert!(stats.success());

    let partition: Value = load_json(&out.join("PS-A/data/book.json")).unwrap();
    assert_eq!(partition["book"][0]["source"], "PS-A");
}
