use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use reading_ledger::{pipeline, PipelineConfig};

/// Rebuild the reading-history tables from library exports and the session log.
#[derive(Debug, Parser)]
#[command(name = "reading-ledger", version, about)]
struct Cli {
    /// Pipeline configuration (JSON).
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Load, normalize and derive, report diagnostics, write nothing.
    #[arg(long)]
    check: bool,

    /// Skip the per-year view tables.
    #[arg(long)]
    no_views: bool,

    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log per-row detail.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    if let Err(error) = run() {
        eprintln!("reading-ledger error: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let config = PipelineConfig::load(&cli.config)
        .with_context(|| format!("failed to load config {}", cli.config.display()))?;

    if cli.check {
        let output = pipeline::run(&config).context("pipeline failed")?;
        info!(
            catalog = output.catalog.len(),
            warnings = output.report.issues().len(),
            "check complete, nothing written"
        );
        return Ok(());
    }

    let (_, report) =
        pipeline::run_and_persist(&config, !cli.no_views).context("pipeline failed")?;
    if !report.is_complete() {
        warn!(
            written = report.written.len(),
            failed = report.failed.len(),
            "some outputs were not written"
        );
    }
    Ok(())
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("READING_LEDGER_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
