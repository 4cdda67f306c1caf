//! dtc-harvest main entry point
//!
//! This is the command-line interface for the DTC definition harvester.

use anyhow::{Context, Result};
use clap::Parser;
use dtc_harvest::config::{load_config_with_hash, validate, Config};
use dtc_harvest::crawler::{HarvestOptions, Harvester};
use dtc_harvest::fetcher::build_fetcher;
use dtc_harvest::output::{build_sinks, print_summary};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// dtc-harvest: a patient harvester of diagnostic trouble code definitions
///
/// dtc-harvest walks a DTC reference site one namespace at a time, decodes
/// every detail page into a record and streams the records to JSON lines,
/// CSV and SQLite outputs as they are produced.
#[derive(Parser, Debug)]
#[command(name = "dtc-harvest")]
#[command(version)]
#[command(about = "A patient harvester of diagnostic trouble code definitions", long_about = None)]
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

    /// Harvest these namespaces instead of the configured ones (repeatable)
    #[arg(short, long = "namespace", value_name = "NAMESPACE")]
    namespaces: Vec<String>,

    /// Cap the listing pages crawled per namespace
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Validate config and show what would be harvested without fetching anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli).context("Invalid command-line override")?;

    tracing::warn!(
        "Make sure harvesting complies with the site's terms of use and robots.txt; requests are paced politely"
    );

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_harvest(&config, &config_hash).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("dtc_harvest=info,warn"),
            1 => EnvFilter::new("dtc_harvest=debug,info"),
            2 => EnvFilter::new("dtc_harvest=trace,debug"),
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

/// Replaces configured values with the ones given on the command line
fn apply_overrides(config: &mut Config, cli: &Cli) -> dtc_harvest::ConfigResult<()> {
    if !cli.namespaces.is_empty() {
        config.harvest.namespaces = cli.namespaces.clone();
    }
    if cli.max_pages.is_some() {
        config.harvest.max_pages = cli.max_pages;
    }
    validate(config)
}

/// Handles the --dry-run mode: shows what would be harvested
fn handle_dry_run(config: &Config) {
    println!("=== dtc-harvest Dry Run ===\n");

    println!("Harvest:");
    println!("  Base URL: {}", config.harvest.base_url);
    println!("  Delay: {:.2}s (+ jitter)", config.harvest.delay);
    match config.harvest.max_pages {
        Some(cap) => println!("  Max listing pages: {}", cap),
        None => println!("  Max listing pages: unlimited"),
    }

    println!("\nFetcher:");
    println!("  Kind: {:?}", config.fetcher.kind);
    println!(
        "  User agent: {}",
        config
            .fetcher
            .user_agent
            .as_deref()
            .unwrap_or("rotating built-in pool")
    );
    println!("  Cookies: {}", if config.fetcher.cookies.is_some() { "supplied" } else { "none" });
    println!("  Proxy: {}", config.fetcher.proxy.as_deref().unwrap_or("none"));
    println!("  Max attempts: {}", config.fetcher.max_attempts);
    println!("  Timeout: {}s", config.fetcher.timeout_secs);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory.display());
    println!("  Formats: {:?}", config.output.formats);

    println!("\nNamespaces ({}):", config.harvest.namespaces.len());
    for namespace in &config.harvest.namespaces {
        println!("  - {}", namespace);
    }

    println!("\n✓ Configuration is valid");
}

/// Harvests every configured namespace in order
///
/// Each namespace gets its own fetcher session and its own sinks. Ctrl-C
/// stops the current namespace between records and skips the rest.
async fn handle_harvest(config: &Config, config_hash: &str) -> Result<()> {
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing after the current record");
            on_signal.cancel();
        }
    });

    let options = HarvestOptions::from_config(config)?;

    for namespace in &config.harvest.namespaces {
        let namespace = namespace.trim().trim_matches('/');
        tracing::info!("=== {} ===", namespace);

        let fetcher = build_fetcher(config)
            .await
            .with_context(|| format!("Failed to start a transport session for {}", namespace))?;
        let mut sinks = build_sinks(config, namespace, config_hash)
            .with_context(|| format!("Failed to open outputs for {}", namespace))?;

        let mut harvester = Harvester::new(options.clone(), fetcher);
        let summary = harvester
            .run(namespace, &mut sinks, &cancel)
            .await
            .with_context(|| format!("Harvest of {} failed", namespace))?;

        print_summary(&summary);

        if summary.interrupted {
            tracing::warn!("Stopping before the remaining namespaces");
            break;
        }
    }

    Ok(())
}
