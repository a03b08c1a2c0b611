//! Command-line interface for javannotate.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::Configuration;
use crate::context::{BuildContext, DeltaTracker, FullBuild};
use crate::logging::LogFormat;
use crate::report::{self, RunSummary};
use crate::runner::{ProcessError, Runner};
use crate::select;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Default incremental state file, relative to the source root.
const DEFAULT_STATE_FILE: &str = ".javannotate-state.json";

/// Keep Java annotations in sync with a configuration file.
///
/// javannotate reads a configuration mapping fully qualified class names to
/// the annotations their class, fields and methods should carry, and
/// rewrites the Java sources under a source root to match it.
#[derive(Parser)]
#[command(name = "javannotate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log format written to stderr
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply configured annotations to the sources under a root
    Run(RunArgs),
    /// Load and validate a configuration without touching any sources
    CheckConfig(CheckConfigArgs),
}

/// Arguments for the run command.
#[derive(Parser)]
pub struct RunArgs {
    /// Path to the configuration file (JSON, or YAML for .yaml/.yml)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Directory containing the Java sources
    #[arg(short, long)]
    pub source_root: PathBuf,

    /// Only process files changed since the last incremental run
    #[arg(short, long)]
    pub incremental: bool,

    /// Incremental state file (default: <source-root>/.javannotate-state.json)
    #[arg(long)]
    pub state_file: Option<PathBuf>,
}

/// Arguments for the check-config command.
#[derive(Parser)]
pub struct CheckConfigArgs {
    /// Path to the configuration file
    #[arg(short, long)]
    pub config: PathBuf,
}

/// Collect the Java files under `root`, sorted, minus excluded paths.
pub fn collect_files(root: &Path, config: &Configuration) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            // Skip hidden directories
            let hidden = e.depth() > 0 && e.file_name().to_string_lossy().starts_with('.');
            !(e.file_type().is_dir() && hidden)
        })
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("java") {
            continue;
        }
        let relative = path.strip_prefix(root).unwrap_or(path);
        if config.is_excluded(relative) {
            debug!(file = %relative.display(), "excluded");
            continue;
        }
        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

/// Run the annotation pass.
pub fn run_annotate(args: &RunArgs) -> anyhow::Result<i32> {
    let config = match Configuration::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    if !args.source_root.is_dir() {
        eprintln!(
            "Error: source root {} does not exist or is not a directory",
            args.source_root.display()
        );
        return Ok(EXIT_ERROR);
    }

    let files = collect_files(&args.source_root, &config)?;
    debug!(count = files.len(), "discovered source files");
    if files.is_empty() {
        eprintln!("Warning: no Java files under {}", args.source_root.display());
        return Ok(EXIT_SUCCESS);
    }

    if !args.incremental {
        let summary = annotate(&config, &files, false, &mut FullBuild)?;
        return Ok(finish(&args.source_root, summary));
    }

    let state_file = args
        .state_file
        .clone()
        .unwrap_or_else(|| args.source_root.join(DEFAULT_STATE_FILE));
    let mut tracker = DeltaTracker::open(&state_file)?;
    let config_changed = tracker.has_delta(&args.config);

    let summary = annotate(&config, &files, config_changed, &mut tracker)?;
    if summary.selected == 0 {
        return Ok(EXIT_SUCCESS);
    }

    for file in &files {
        if summary.faults.iter().any(|f| &f.file == file) {
            tracker.forget(file);
        } else {
            tracker.record(file);
        }
    }
    tracker.record(&args.config);
    tracker.save()?;
    debug!(path = %tracker.state_path().display(), "saved incremental state");

    Ok(finish(&args.source_root, summary))
}

/// Select the work set and process it, notifying `context` of every rewrite.
fn annotate(
    config: &Configuration,
    files: &[PathBuf],
    config_changed: bool,
    context: &mut dyn BuildContext,
) -> anyhow::Result<RunSummary> {
    let selected = select::select(files, context.is_incremental(), config_changed, |path| {
        context.has_delta(path)
    });

    let mut summary = RunSummary {
        discovered: files.len(),
        selected: selected.len(),
        ..RunSummary::default()
    };
    if selected.is_empty() {
        info!("No files have changed! Not processing...");
        return Ok(summary);
    }

    let (rewritten, faults) = match Runner::new(config).process(&selected) {
        Ok(rewritten) => (rewritten, Vec::new()),
        Err(ProcessError::Faults(report)) => (report.rewritten, report.faults),
        Err(e) => return Err(e.into()),
    };

    for file in &rewritten {
        info!("Processed {}", file.display());
        context.refresh(file);
    }
    summary.rewritten = rewritten;
    summary.faults = faults;
    Ok(summary)
}

fn finish(root: &Path, summary: RunSummary) -> i32 {
    report::write_summary(root, &summary);
    if summary.passed() {
        EXIT_SUCCESS
    } else {
        EXIT_FAILED
    }
}

/// Run the check-config command.
pub fn run_check_config(args: &CheckConfigArgs) -> anyhow::Result<i32> {
    match Configuration::load(&args.config) {
        Ok(config) => {
            report::write_config_summary(&args.config, &config);
            Ok(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: invalid configuration: {}", e);
            Ok(EXIT_ERROR)
        }
    }
}
