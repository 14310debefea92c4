//! tomesort-audit - Cross-reference audit over a partitioned corpus
//!
//! Resolves every textual `{@tag}` reference against the record index and
//! every image-asset reference against the asset tree, classifies each
//! occurrence, and reports the tallies. Exit code 1 means critical
//! findings exist; 2 means the environment was unusable.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{error, info};

use tomesort_common::config::{PathOverrides, DEFAULT_SAMPLE_LIMIT};
use tomesort_common::fsops::ensure_dir;

use tomesort_audit::corpus::Corpus;
use tomesort_audit::runner::{self, AuditOptions};
use tomesort_audit::{AssetResolver, Severity};

/// Command-line arguments for tomesort-audit
#[derive(Parser, Debug)]
#[command(name = "tomesort-audit")]
#[command(about = "Audit cross-references in a partitioned game-content corpus")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Partitioned corpus root
    #[arg(long, default_value = "data_rework", env = "TOMESORT_REWORK_DIR")]
    data_dir: PathBuf,

    /// Asset tree root
    #[arg(long, default_value = "img", env = "TOMESORT_IMG_DIR")]
    img_dir: PathBuf,

    /// Restrict the audit to these sources
    #[arg(long, num_args = 1..)]
    sources: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Write the JSON report here as well
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Minimum severity shown in text output
    #[arg(long, value_enum, default_value_t = SeverityArg::All)]
    severity: SeverityArg,

    /// Concrete examples retained per outcome class
    #[arg(long, default_value_t = DEFAULT_SAMPLE_LIMIT)]
    sample_limit: usize,

    /// Replacement path-convention override table (TOML)
    #[arg(long)]
    overrides: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check textual {@tag} references against the record index
    Links,
    /// Check image-asset references against the asset tree
    Images {
        /// Also report assets never referenced by any record
        #[arg(long)]
        orphans: bool,
    },
    /// Check the source purity invariant
    Purity,
    /// Run every check
    All {
        /// Also report assets never referenced by any record
        #[arg(long)]
        orphans: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Text,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SeverityArg {
    Critical,
    Warning,
    All,
}

impl SeverityArg {
    fn min_severity(self) -> Severity {
        match self {
            SeverityArg::Critical => Severity::Critical,
            SeverityArg::Warning => Severity::Warning,
            SeverityArg::All => Severity::Info,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tomesort_audit=info,tomesort_common=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting tomesort-audit v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    match run(&cli) {
        Ok(failed) => {
            if failed {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!("Audit aborted: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<bool> {
    let options = audit_options(&cli.command, cli.common.sample_limit);

    // Environment errors are fatal before any processing begins.
    ensure_dir(&cli.common.data_dir, "data")?;
    if options.check_images {
        ensure_dir(&cli.common.img_dir, "image")?;
    }

    let sources = if cli.common.sources.is_empty() {
        None
    } else {
        Some(cli.common.sources.as_slice())
    };

    let corpus = Corpus::load(&cli.common.data_dir, sources)
        .with_context(|| format!("loading corpus from {}", cli.common.data_dir.display()))?;

    let resolver = if options.check_images {
        let overrides = match &cli.common.overrides {
            Some(path) => PathOverrides::from_toml_file(path)
                .with_context(|| format!("loading override table {}", path.display()))?,
            None => PathOverrides::builtin().clone(),
        };
        Some(AssetResolver::new(cli.common.img_dir.clone(), overrides))
    } else {
        None
    };

    let report = runner::run(&corpus, resolver.as_ref(), options);

    match cli.common.format {
        Format::Text => {
            println!("{}", report.render_text(cli.common.severity.min_severity()));
        }
        Format::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    if let Some(output) = &cli.common.output {
        let value = serde_json::to_value(&report)?;
        tomesort_common::json_io::save_json(output, &value)?;
        info!("Report saved to {}", output.display());
    }

    Ok(report.failed())
}

fn audit_options(command: &Command, sample_limit: usize) -> AuditOptions {
    match command {
        Command::Links => AuditOptions {
            check_links: true,
            check_images: false,
            check_purity: false,
            check_orphans: false,
            sample_limit,
        },
        Command::Images { orphans } => AuditOptions {
            check_links: false,
            check_images: true,
            check_purity: false,
            check_orphans: *orphans,
            sample_limit,
        },
        Command::Purity => AuditOptions {
            check_links: false,
            check_images: false,
            check_purity: true,
            check_orphans: false,
            sample_limit,
        },
        Command::All { orphans } => AuditOptions {
            check_links: true,
            check_images: true,
            check_purity: true,
            check_orphans: *orphans,
            sample_limit,
        },
    }
}
