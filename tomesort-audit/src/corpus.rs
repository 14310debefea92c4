//! Partitioned corpus loading
//!
//! A partitioned corpus is one directory per source, each with a `data/`
//! subdirectory of record files (plus the bestiary/class/book/adventure
//! subdirectories some categories use). Loading happens completely before
//! classification; unreadable files are data errors that skip one unit,
//! never the run.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info, warn};

use tomesort_common::json_io::load_json;
use tomesort_common::records::extract_entity_arrays;

/// Subdirectories of each source's `data/` holding further record files.
static DATA_SUBDIRS: &[&str] = &["bestiary", "class", "book", "adventure"];

/// One loaded record file.
#[derive(Debug)]
pub struct RecordFile {
    /// Partition (source directory) the file belongs to.
    pub source: String,
    /// Path relative to the corpus root, e.g. `PHB/data/spells.json`.
    pub rel_path: String,
    /// Entity arrays keyed by category.
    pub arrays: Vec<(String, Vec<Value>)>,
}

/// A fully loaded corpus plus the data errors hit while loading.
#[derive(Debug, Default)]
pub struct Corpus {
    pub files: Vec<RecordFile>,
    pub data_errors: Vec<String>,
    pub sources_scanned: usize,
}

impl Corpus {
    /// Load every record file under `root`, optionally restricted to a
    /// set of sources.
    pub fn load(root: &Path, sources: Option<&[String]>) -> std::io::Result<Self> {
        let mut corpus = Corpus::default();

        let mut source_dirs: Vec<PathBuf> = std::fs::read_dir(root)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        source_dirs.sort();

        for source_dir in source_dirs {
            let Some(source_id) = source_dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if source_id.starts_with('.') {
                continue;
            }
            if let Some(wanted) = sources {
                if !wanted.iter().any(|s| s == source_id) {
                    continue;
                }
            }

            let data_dir = source_dir.join("data");
            if !data_dir.is_dir() {
                debug!("No data directory for {}, skipping", source_id);
                continue;
            }

            corpus.sources_scanned += 1;
            let mut files = json_files_in(&data_dir)?;
            for subdir in DATA_SUBDIRS {
                let nested = data_dir.join(subdir);
                if nested.is_dir() {
                    files.extend(json_files_in(&nested)?);
                }
            }

            for path in files {
                let rel_path = path
                    .strip_prefix(root)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .replace('\\', "/");

                match load_json(&path) {
                    Ok(data) => {
                        let arrays = extract_entity_arrays(&data, None);
                        corpus.files.push(RecordFile {
                            source: source_id.to_string(),
                            rel_path,
                            arrays,
                        });
                    }
                    Err(e) => {
                        warn!("Skipping unreadable file: {}", e);
                        corpus.data_errors.push(e.to_string());
                    }
                }
            }
        }

        info!(
            "Loaded {} record files from {} sources",
            corpus.files.len(),
            corpus.sources_scanned
        );
        Ok(corpus)
    }

    pub fn files_scanned(&self) -> usize {
        self.files.len()
    }
}

fn json_files_in(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tomesort_common::json_io::save_json;

    #[test]
    fn loads_sources_and_nested_subdirs() {
        let dir = tempfile::tempdir().unwrap();
        save_json(
            &dir.path().join("PHB/data/spells.json"),
            &json!({"spell": [{"name": "Fireball", "source": "PHB"}]}),
        )
        .unwrap();
        save_json(
            &dir.path().join("MM/data/bestiary/bestiary.json"),
            &json!({"monster": [{"name": "Goblin", "source": "MM"}]}),
        )
        .unwrap();

        let corpus = Corpus::load(dir.path(), None).unwrap();
        assert_eq!(corpus.sources_scanned, 2);
        assert_eq!(corpus.files_scanned(), 2);

        let rels: Vec<&str> = corpus.files.iter().map(|f| f.rel_path.as_str()).collect();
        assert!(rels.contains(&"PHB/data/spells.json"));
        assert!(rels.contains(&"MM/data/bestiary/bestiary.json"));
    }

    #[test]
    fn source_filter_restricts_loading() {
        let dir = tempfile::tempdir().unwrap();
        for source in ["PHB", "MM"] {
            save_json(
                &dir.path().join(source).join("data/file.json"),
                &json!({"spell": [{"name": "X", "source": source}]}),
            )
            .unwrap();
        }

        let wanted = vec!["PHB".to_string()];
        let corpus = Corpus::load(dir.path(), Some(&wanted)).unwrap();
        assert_eq!(corpus.sources_scanned, 1);
        assert_eq!(corpus.files[0].source, "PHB");
    }

    #[test]
    fn unreadable_file_is_a_data_error() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("PHB/data/bad.json");
        std::fs::create_dir_all(bad.parent().unwrap()).unwrap();
        std::fs::write(&bad, "{broken").unwrap();

        let corpus = Corpus::load(dir.path(), None).unwrap();
        assert_eq!(corpus.files_scanned(), 0);
        assert_eq!(corpus.data_errors.len(), 1);
    }
}
