//! VC-Harvester main entry point
//!
//! This is the command-line interface for the VC-Harvester batch pipeline.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::{Path, PathBuf};
use vc_harvester::config::{load_config_with_hash, load_seeds, Config};
use vc_harvester::logging;
use vc_harvester::output::print_report;
use vc_harvester::Coordinator;

/// VC-Harvester: company records from venture-capital portfolio pages
///
/// VC-Harvester fetches each seed page, reduces it to text and links, asks a
/// language model for the portfolio company's details, discards fields that
/// point back at the VC's own site, and appends one CSV row per company.
#[derive(Parser, Debug)]
#[command(name = "vc-harvester")]
#[command(version)]
#[command(about = "Extract company records from VC portfolio pages", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Additional seed file: one URL per line, or `vc,startup` CSV rows
    #[arg(long, value_name = "FILE")]
    seeds: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Also append diagnostics to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Validate config and seeds and show what would run without fetching anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    logging::init(cli.verbose, cli.quiet, cli.log_file.as_deref())
        .context("failed to open log file")?;

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let seeds = collect_seeds(&config, cli.seeds.as_deref())?;
    if seeds.is_empty() {
        bail!("no seed URLs: add [batch] seeds to the config or pass --seeds");
    }

    if cli.dry_run {
        handle_dry_run(&config, &seeds);
        return Ok(());
    }

    handle_batch(&config, seeds).await
}

/// Concatenates config seeds and seed-file entries, config first
fn collect_seeds(config: &Config, seed_file: Option<&Path>) -> anyhow::Result<Vec<String>> {
    let mut seeds = config.batch.seeds.clone();

    if let Some(path) = seed_file {
        let from_file = load_seeds(path)
            .with_context(|| format!("failed to read seed file {}", path.display()))?;
        tracing::info!("Loaded {} seed URL(s) from {}", from_file.len(), path.display());
        seeds.extend(from_file);
    }

    Ok(seeds)
}

/// Handles the --dry-run mode: shows the effective configuration and seeds
fn handle_dry_run(config: &Config, seeds: &[String]) {
    println!("=== VC-Harvester Dry Run ===\n");

    println!("Fetcher:");
    println!("  Timeout: {}s", config.fetcher.timeout_secs);
    println!("  Max attempts: {}", config.fetcher.max_attempts);
    println!("  Backoff base: {}ms", config.fetcher.backoff_base_ms);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nExtraction:");
    println!("  Model: {}", config.extraction.model);
    println!("  API base: {}", config.extraction.api_base);
    println!("  API key variable: {}", config.extraction.api_key_env);
    println!("  Max retries: {}", config.extraction.max_retries);

    println!("\nValidation:");
    println!("  Host match: {:?}", config.validation.host_match);

    println!("\nOutput:");
    println!("  Sink: {}", config.output.sink_path);

    println!("\nSeeds ({}):", seeds.len());
    for seed in seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would process {} seed URL(s) with {} worker(s)",
        seeds.len(),
        config.batch.worker_limit
    );
}

/// Handles the main batch run
async fn handle_batch(config: &Config, seeds: Vec<String>) -> anyhow::Result<()> {
    let coordinator =
        Coordinator::from_config(config).context("failed to set up the extraction pipeline")?;

    let report = coordinator.run_batch(seeds).await;
    print_report(&report, &config.output.sink_path);

    Ok(())
}
