//! Course-Mirror main entry point
//!
//! This is the command-line interface for the Course-Mirror offline site mirror.

use anyhow::Context;
use clap::Parser;
use course_mirror::config::{load_config_with_hash, load_substitutions, Config};
use course_mirror::mirror::{Coordinator, RunOptions};
use course_mirror::page::HttpSession;
use course_mirror::progress::{IndicatifSink, LogSink, ProgressSink};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Course-Mirror: an offline mirror for course sites
///
/// Course-Mirror loads each selected course page, rewrites its links so the
/// mirrored tree can be browsed offline, and downloads every linked resource
/// that belongs to the tree. Re-runs skip files that already exist.
#[derive(Parser, Debug)]
#[command(name = "course-mirror")]
#[command(version)]
#[command(about = "An offline mirror for course sites", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Only mirror the unit with this label (repeatable); disables the missing report
    #[arg(long = "unit", value_name = "LABEL")]
    units: Vec<String>,

    /// TOML file of text substitutions merged over the config's table
    #[arg(long, value_name = "FILE")]
    substitutions: Option<PathBuf>,

    /// Log progress lines instead of drawing progress bars
    #[arg(long)]
    no_progress: bool,

    /// Validate config and show what would be mirrored without fetching anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let substitutions = match &cli.substitutions {
        Some(path) => {
            let subs = load_substitutions(path)
                .with_context(|| format!("Failed to load substitutions {}", path.display()))?;
            tracing::info!("Loaded {} substitution(s) from {}", subs.len(), path.display());
            Some(subs)
        }
        None => None,
    };

    let options = RunOptions {
        unit_filter: cli.units.clone(),
        substitutions,
    };

    if cli.dry_run {
        handle_dry_run(&config, options)
    } else {
        handle_mirror(&config, options, cli.no_progress || cli.quiet).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("course_mirror=info,warn"),
            1 => EnvFilter::new("course_mirror=debug,info"),
            2 => EnvFilter::new("course_mirror=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be mirrored
fn handle_dry_run(config: &Config, options: RunOptions) -> anyhow::Result<()> {
    let coordinator = Coordinator::new(config, options, Box::new(LogSink::default()))?;

    println!("=== Course-Mirror Dry Run ===\n");

    println!("Mirror:");
    println!("  Root: {}", config.mirror.root);
    println!("  Tree root: {}", config.mirror.tree_root);

    let scope = config.scope_config()?;
    println!("\nScope:");
    println!("  Hosts: {}", scope.allowed_hosts().collect::<Vec<_>>().join(", "));
    println!("  Path prefixes: {}", scope.allowed_path_prefixes().join(", "));
    for prefix in scope.excluded_prefixes() {
        println!("  Excluded: {}", prefix);
    }

    let rules = config.rewrite_rule()?;
    println!("\nRewrite:");
    match &rules.host_fix {
        Some(fix) => println!("  Host: {} -> {}", fix.from_host(), fix.to_host()),
        None => println!("  Host: unchanged"),
    }
    match &rules.path_rewrite {
        Some(seg) => println!("  Year segment after /{}/: {}", seg.anchor(), seg.segment()),
        None => println!("  Year segment: unchanged"),
    }
    println!("  Text substitutions: {}", config.substitutions.len());

    println!("\nFetch:");
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!("  User agent: {}", config.fetch.user_agent);
    println!("  Accept invalid certificates: {}", config.fetch.accept_invalid_certs);

    println!("\nUnits ({}):", coordinator.units().len());
    for unit in coordinator.units() {
        println!("  - {} ({})", unit.label, unit.url);
    }

    println!(
        "\nMissing report: {}",
        if coordinator.reporting_enabled() { "on" } else { "off" }
    );

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main mirror operation
async fn handle_mirror(config: &Config, options: RunOptions, no_progress: bool) -> anyhow::Result<()> {
    let sink: Box<dyn ProgressSink> = if no_progress {
        Box::new(LogSink::default())
    } else {
        Box::new(IndicatifSink::new())
    };

    let mut coordinator = Coordinator::new(config, options, sink)?;

    let mut session = HttpSession::with_timeout(
        &config.fetch.user_agent,
        config.fetch_timeout(),
        config.fetch.accept_invalid_certs,
    )
    .context("Failed to build page session")?;

    match coordinator.run(&mut session).await {
        Ok(summary) => {
            tracing::info!(
                "Mirror completed: {}/{} unit(s) ok, {} downloaded, {} already present, {} failed",
                summary.units_total - summary.units_failed,
                summary.units_total,
                summary.downloaded,
                summary.skipped,
                summary.failed_resources
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Mirror failed: {}", e);
            Err(e.into())
        }
    }
}
