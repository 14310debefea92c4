//! tomesort-split - Partition a category-grouped corpus by source
//!
//! Reads the original corpus (records grouped by content type), groups
//! every record by its declared `source`, and writes one partition per
//! publication under the output directory, copying each source's assets
//! alongside. The original corpus is never modified.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};

use tomesort_common::catalog::SourceCatalog;
use tomesort_common::config::{PathOverrides, SkipRules};
use tomesort_common::fsops::ensure_dir;
use tomesort_common::Error;

use tomesort_split::images::copy_source_images;
use tomesort_split::stats::{SplitReport, SplitStats};
use tomesort_split::writer::split_file;

/// Subdirectories of the data root holding additional record files.
static SPECIAL_DATA_SUBDIRS: &[&str] = &["bestiary", "class", "book", "adventure"];

/// Command-line arguments for tomesort-split
#[derive(Parser, Debug)]
#[command(name = "tomesort-split")]
#[command(about = "Partition a game-content corpus by publication source")]
#[command(version)]
struct Args {
    /// Directory holding the category-grouped corpus
    #[arg(long, default_value = "data", env = "TOMESORT_DATA_DIR")]
    data_dir: PathBuf,

    /// Directory holding the asset tree
    #[arg(long, default_value = "img", env = "TOMESORT_IMG_DIR")]
    img_dir: PathBuf,

    /// Directory receiving the partitioned corpus
    #[arg(short, long, default_value = "data_rework", env = "TOMESORT_OUTPUT_DIR")]
    output_dir: PathBuf,

    /// Restrict processing to these sources
    #[arg(long, num_args = 1..)]
    sources: Vec<String>,

    /// Apply (name, source) deduplication before grouping
    #[arg(long)]
    dedup: bool,

    /// Skip asset copying
    #[arg(long)]
    skip_images: bool,

    /// Replacement path-convention override table (TOML)
    #[arg(long)]
    overrides: Option<PathBuf>,

    /// Where to write the JSON run report
    #[arg(long, default_value = "reorganization-report.json")]
    report: PathBuf,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tomesort_split=info,tomesort_common=info".into()),
        )
        .init();

    info!("Starting tomesort-split v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    match run(&args) {
        Ok(success) => {
            if success {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            error!("Partitioning aborted: {:#}", e);
            // Missing roots and other pre-flight failures exit 2.
            ExitCode::from(2)
        }
    }
}

fn run(args: &Args) -> anyhow::Result<bool> {
    // Environment errors are fatal before any processing begins.
    ensure_dir(&args.data_dir, "data")?;
    if !args.skip_images {
        ensure_dir(&args.img_dir, "image")?;
    }

    let overrides = match &args.overrides {
        Some(path) => PathOverrides::from_toml_file(path)
            .with_context(|| format!("loading override table {}", path.display()))?,
        None => PathOverrides::builtin().clone(),
    };

    let catalog = SourceCatalog::load(&args.data_dir).map_err(|e| match e {
        // No catalog means we cannot attribute anything: treat as environment.
        Error::Config(msg) => Error::Environment(msg),
        other => other,
    })?;
    info!("Catalog carries {} sources", catalog.len());

    let selected: Vec<String> = if args.sources.is_empty() {
        catalog.ids().map(String::from).collect()
    } else {
        for id in &args.sources {
            if !catalog.contains(id) {
                warn!("Requested source '{}' is not in the catalog", id);
            }
        }
        args.sources.clone()
    };

    std::fs::create_dir_all(&args.output_dir)?;

    let skip_rules = SkipRules::default();
    let mut stats = SplitStats::default();

    for json_path in collect_record_files(&args.data_dir, &skip_rules)? {
        split_file(&json_path, &catalog, &args.output_dir, args.dedup, &mut stats)?;
    }

    if !args.skip_images {
        info!("Copying images for {} sources...", selected.len());
        for source_id in &selected {
            copy_source_images(source_id, &args.img_dir, &args.output_dir, &overrides, &mut stats);
        }
    }

    let report = SplitReport::new(selected.len(), stats, true);
    let report_value = serde_json::to_value(&report)?;
    tomesort_common::json_io::save_json(&args.report, &report_value)?;
    info!("Report saved to {}", args.report.display());

    info!(
        "Partitioning complete: {} records, {} images, {} warnings, {} errors",
        report.total_records,
        report.total_images,
        report.statistics.warnings.len(),
        report.statistics.errors.len()
    );

    Ok(report.success)
}

/// Record files to split: the data root's own JSON files plus the special
/// per-category subdirectories, minus the skip lists.
fn collect_record_files(data_dir: &Path, skip: &SkipRules) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    let mut push_dir = |dir: &Path| -> anyhow::Result<()> {
        if !dir.is_dir() {
            return Ok(());
        }
        let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();
        entries.sort();
        for path in entries {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if skip.should_skip_file(name) {
                continue;
            }
            files.push(path);
        }
        Ok(())
    };

    push_dir(data_dir)?;
    for subdir in SPECIAL_DATA_SUBDIRS {
        if skip.should_skip_dir(subdir) {
            continue;
        }
        push_dir(&data_dir.join(subdir))?;
    }

    Ok(files)
}
