//! Audit aggregation and reporting
//!
//! Workers accumulate into local tallies; tallies merge associatively at
//! the end of the run. Reports keep a bounded sample per outcome class so
//! a corpus-wide audit stays readable, but every issue is counted; only
//! rendering filters by severity, never aggregation.

use indexmap::IndexMap;
use serde::Serialize;

use crate::classify::{Classification, Outcome, Severity};
use crate::purity::PurityViolation;

/// One concrete example retained for the report.
#[derive(Debug, Clone, Serialize)]
pub struct IssueSample {
    /// Reference kind, `tag:<kind>` or `image:<category>`.
    pub kind: String,
    /// Raw tag markup or asset path.
    pub target: String,
    /// Referencing record, `Name (SOURCE) in file`.
    pub location: String,
    pub severity: Severity,
    pub message: String,
}

/// Classification results accumulated by one worker.
#[derive(Debug)]
pub struct Tally {
    sample_limit: usize,
    pub references_checked: usize,
    pub outcome_counts: IndexMap<Outcome, usize>,
    /// Per reference kind (`tag:spell`, `image:bestiary`, ...).
    pub kind_counts: IndexMap<String, usize>,
    pub samples: IndexMap<Outcome, Vec<IssueSample>>,
    pub data_errors: Vec<String>,
}

impl Tally {
    pub fn new(sample_limit: usize) -> Self {
        Self {
            sample_limit,
            references_checked: 0,
            outcome_counts: IndexMap::new(),
            kind_counts: IndexMap::new(),
            samples: IndexMap::new(),
            data_errors: Vec::new(),
        }
    }

    /// Record one classified occurrence.
    pub fn record(
        &mut self,
        kind: String,
        target: String,
        location: String,
        classification: &Classification,
    ) {
        self.references_checked += 1;
        *self
            .outcome_counts
            .entry(classification.outcome)
            .or_default() += 1;
        *self.kind_counts.entry(kind.clone()).or_default() += 1;

        let samples = self.samples.entry(classification.outcome).or_default();
        if samples.len() < self.sample_limit {
            samples.push(IssueSample {
                kind,
                target,
                location,
                severity: classification.severity,
                message: classification.message.clone(),
            });
        }
    }

    pub fn add_data_error(&mut self, error: String) {
        self.data_errors.push(error);
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.outcome_counts.get(&outcome).copied().unwrap_or(0)
    }

    /// Merge another worker's tally into this one. Samples stay bounded;
    /// merge order decides which examples survive, so callers merge in
    /// file order for reproducible reports.
    pub fn merge(mut self, other: Tally) -> Tally {
        self.references_checked += other.references_checked;
        for (outcome, count) in other.outcome_counts {
            *self.outcome_counts.entry(outcome).or_default() += count;
        }
        for (kind, count) in other.kind_counts {
            *self.kind_counts.entry(kind).or_default() += count;
        }
        for (outcome, samples) in other.samples {
            let mine = self.samples.entry(outcome).or_default();
            for sample in samples {
                if mine.len() >= self.sample_limit {
                    break;
                }
                mine.push(sample);
            }
        }
        self.data_errors.extend(other.data_errors);
        self
    }
}

#[derive(Debug, Serialize)]
pub struct ScanSummary {
    pub sources_scanned: usize,
    pub files_scanned: usize,
    pub references_checked: usize,
}

#[derive(Debug, Serialize)]
pub struct ClassReport {
    pub count: usize,
    pub sample: Vec<IssueSample>,
}

#[derive(Debug, Serialize)]
pub struct SummaryCounts {
    pub critical_issues: usize,
    pub warning_issues: usize,
    pub info_issues: usize,
    pub special_design_decisions: usize,
}

#[derive(Debug, Serialize)]
pub struct OrphanReport {
    pub count: usize,
    pub sample: Vec<String>,
}

/// The externally observable output of an audit run.
#[derive(Debug, Serialize)]
pub struct AuditReport {
    pub timestamp: String,
    pub scan_summary: ScanSummary,
    /// Outcome class -> count and bounded sample, severest class first.
    pub issues: IndexMap<&'static str, ClassReport>,
    pub kind_counts: IndexMap<String, usize>,
    pub summary: SummaryCounts,
    pub purity_violations: ClassPurityReport,
    pub orphans: OrphanReport,
    pub data_errors: Vec<String>,
    pub recommendations: Vec<String>,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ClassPurityReport {
    pub count: usize,
    pub sample: Vec<PurityViolation>,
}

impl AuditReport {
    pub fn build(
        mut tally: Tally,
        sources_scanned: usize,
        files_scanned: usize,
        purity: Vec<PurityViolation>,
        orphans: Vec<String>,
        sample_limit: usize,
    ) -> Self {
        let mut issues = IndexMap::new();
        for outcome in Outcome::ALL {
            issues.insert(
                outcome.as_str(),
                ClassReport {
                    count: tally.count(outcome),
                    sample: tally.samples.shift_remove(&outcome).unwrap_or_default(),
                },
            );
        }

        let critical = tally.count(Outcome::Missing) + purity.len();
        let warning = tally.count(Outcome::UnexpectedLocation);
        let info = tally.count(Outcome::Valid)
            + tally.count(Outcome::SpecialCase)
            + tally.count(Outcome::CrossSource);

        let summary = SummaryCounts {
            critical_issues: critical,
            warning_issues: warning,
            info_issues: info,
            special_design_decisions: tally.count(Outcome::SpecialCase),
        };

        let recommendations = build_recommendations(&tally, &purity, &orphans);
        let status = if critical > 0 { "failed" } else { "passed" };

        let mut kind_counts = tally.kind_counts;
        kind_counts.sort_keys();

        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            scan_summary: ScanSummary {
                sources_scanned,
                files_scanned,
                references_checked: tally.references_checked,
            },
            issues,
            kind_counts,
            summary,
            purity_violations: ClassPurityReport {
                count: purity.len(),
                sample: purity.into_iter().take(sample_limit).collect(),
            },
            orphans: OrphanReport {
                count: orphans.len(),
                sample: orphans.into_iter().take(sample_limit).collect(),
            },
            data_errors: tally.data_errors,
            recommendations,
            status,
        }
    }

    pub fn failed(&self) -> bool {
        self.status == "failed"
    }

    /// Flat text rendering, filtered to `min_severity` and above.
    pub fn render_text(&self, min_severity: Severity) -> String {
        let mut lines = Vec::new();
        lines.push("=".repeat(60));
        lines.push("CROSS-REFERENCE AUDIT REPORT".to_string());
        lines.push("=".repeat(60));
        lines.push(format!("Timestamp: {}", self.timestamp));
        lines.push(String::new());
        lines.push("SCAN SUMMARY:".to_string());
        lines.push(format!(
            "  Sources scanned: {}",
            self.scan_summary.sources_scanned
        ));
        lines.push(format!(
            "  Files scanned: {}",
            self.scan_summary.files_scanned
        ));
        lines.push(format!(
            "  References checked: {}",
            self.scan_summary.references_checked
        ));
        lines.push(String::new());
        lines.push("ISSUES:".to_string());
        lines.push(format!("  Critical: {}", self.summary.critical_issues));
        lines.push(format!("  Warning: {}", self.summary.warning_issues));
        lines.push(format!("  Info: {}", self.summary.info_issues));
        lines.push(format!(
            "  Special design decisions: {}",
            self.summary.special_design_decisions
        ));
        lines.push(String::new());

        for outcome in Outcome::ALL {
            if outcome == Outcome::Valid {
                continue; // valid references are counted, not listed
            }
            if outcome.severity() < min_severity {
                continue;
            }
            let Some(class) = self.issues.get(outcome.as_str()) else {
                continue;
            };
            if class.count == 0 {
                continue;
            }

            lines.push(format!(
                "{}: {}",
                outcome.as_str().to_uppercase().replace('_', " "),
                class.count
            ));
            for sample in &class.sample {
                lines.push(format!("  - {} [{}]", sample.target, sample.kind));
                lines.push(format!("    In: {}", sample.location));
                lines.push(format!("    {}", sample.message));
            }
            if class.count > class.sample.len() {
                lines.push(format!(
                    "  ... and {} more",
                    class.count - class.sample.len()
                ));
            }
            lines.push(String::new());
        }

        if self.purity_violations.count > 0 {
            lines.push(format!(
                "SOURCE PURITY VIOLATIONS: {}",
                self.purity_violations.count
            ));
            for violation in &self.purity_violations.sample {
                lines.push(format!(
                    "  - {}: {} -> {} ({})",
                    violation.record,
                    violation.expected_source,
                    violation.actual_source,
                    violation.file
                ));
            }
            lines.push(String::new());
        }

        if self.orphans.count > 0 && min_severity <= Severity::Warning {
            lines.push(format!("ORPHANED ASSETS: {}", self.orphans.count));
            for orphan in &self.orphans.sample {
                lines.push(format!("  - {orphan}"));
            }
            if self.orphans.count > self.orphans.sample.len() {
                lines.push(format!(
                    "  ... and {} more",
                    self.orphans.count - self.orphans.sample.len()
                ));
            }
            lines.push(String::new());
        }

        if !self.data_errors.is_empty() {
            lines.push(format!("DATA ERRORS: {}", self.data_errors.len()));
            for error in &self.data_errors {
                lines.push(format!("  - {error}"));
            }
            lines.push(String::new());
        }

        lines.push("RECOMMENDATIONS:".to_string());
        for recommendation in &self.recommendations {
            lines.push(format!("  * {recommendation}"));
        }
        lines.push(String::new());
        lines.push(format!("STATUS: {}", self.status.to_uppercase()));
        lines.push("=".repeat(60));

        lines.join("\n")
    }
}

fn build_recommendations(
    tally: &Tally,
    purity: &[PurityViolation],
    orphans: &[String],
) -> Vec<String> {
    let mut recommendations = Vec::new();

    let missing = tally.count(Outcome::Missing);
    if missing > 0 {
        recommendations.push(format!(
            "Found {missing} missing references. These should be investigated and fixed."
        ));
    }

    let unexpected = tally.count(Outcome::UnexpectedLocation);
    if unexpected > 0 {
        recommendations.push(format!(
            "Found {unexpected} assets in unexpected locations. \
             Consider moving them to expected paths or updating references."
        ));
    }

    if !purity.is_empty() {
        recommendations.push(format!(
            "Found {} records attributed to the wrong partition. \
             Re-run the partitioner for the affected sources.",
            purity.len()
        ));
    }

    if !orphans.is_empty() {
        recommendations.push(format!(
            "Found {} assets never referenced by any record.",
            orphans.len()
        ));
    }

    if recommendations.is_empty() {
        recommendations.push(
            "All references are valid or follow known design decisions. No action required."
                .to_string(),
        );
    }

    recommendations
}
