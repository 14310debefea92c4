//! Run statistics and the split report

use indexmap::IndexMap;
use serde::Serialize;

/// Statistics accumulated over one partitioning run.
#[derive(Debug, Default, Serialize)]
pub struct SplitStats {
    /// input filename -> source id -> records written.
    pub files: IndexMap<String, IndexMap<String, usize>>,
    /// source id -> asset category -> files copied.
    pub images: IndexMap<String, IndexMap<String, usize>>,
    /// Records excluded from every partition for lack of a source field.
    pub quarantined: Vec<String>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl SplitStats {
    pub fn add_file_count(&mut self, filename: &str, source_id: &str, count: usize) {
        *self
            .files
            .entry(filename.to_string())
            .or_default()
            .entry(source_id.to_string())
            .or_default() += count;
    }

    pub fn add_image_count(&mut self, source_id: &str, category: &str, count: usize) {
        *self
            .images
            .entry(source_id.to_string())
            .or_default()
            .entry(category.to_string())
            .or_default() += count;
    }

    pub fn add_quarantined(&mut self, name: String) {
        self.quarantined.push(name);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }

    pub fn total_records(&self) -> usize {
        self.files.values().flat_map(|m| m.values()).sum()
    }

    pub fn total_images(&self) -> usize {
        self.images.values().flat_map(|m| m.values()).sum()
    }

    /// A run succeeds when no data errors occurred; quarantined records
    /// and unknown sources are warnings, not failures.
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Final report document for a partitioning run.
#[derive(Debug, Serialize)]
pub struct SplitReport {
    pub timestamp: String,
    pub version: &'static str,
    pub sources_processed: usize,
    pub total_records: usize,
    pub total_images: usize,
    pub statistics: SplitStats,
    pub success: bool,
    /// Set when the run was interrupted before completing; partial
    /// partition output must never masquerade as a full run.
    pub complete: bool,
}

impl SplitReport {
    pub fn new(sources_processed: usize, stats: SplitStats, complete: bool) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION"),
            sources_processed,
            total_records: stats.total_records(),
            total_images: stats.total_images(),
            success: stats.success() && complete,
            complete,
            statistics: stats,
        }
    }
}
