//! Contact-Harvest main entry point
//!
//! This is the command-line interface for the Contact-Harvest email extractor.

use anyhow::{bail, Context};
use chrono::Local;
use clap::Parser;
use contact_harvest::config::{load_config_with_hash, Config};
use contact_harvest::output::{
    default_report_name, print_statistics, save_report, BatchStatistics, ReportFormat,
};
use contact_harvest::{Coordinator, ProgressState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Contact-Harvest: email address extraction for lists of websites
///
/// Contact-Harvest visits every site in the input file along with its usual
/// contact and about pages, and writes every email address it finds to a
/// report.
#[derive(Parser, Debug)]
#[command(name = "contact-harvest")]
#[command(version = "1.0.0")]
#[command(about = "Extracts email addresses from websites", long_about = None)]
struct Cli {
    /// Text file with one site per line (blank lines and # comments ignored)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Report file to write (default: extracted_emails_<timestamp>.<ext>)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Report layout: domains, rows or json
    #[arg(long, default_value = "domains")]
    format: ReportFormat,

    /// Fetch over plain HTTP only, without starting the browser driver
    #[arg(long)]
    no_renderer: bool,

    /// Process only the first N distinct sites of the input file
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    max_urls: Option<u64>,

    /// Show which URLs and pages would be visited without fetching anything
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = load_configuration(cli.config.as_deref())?;
    if cli.no_renderer {
        config.renderer.enabled = false;
    }

    let urls = read_url_list(&cli.input)?;
    tracing::info!("Read {} entries from {}", urls.len(), cli.input.display());

    let coordinator = Coordinator::new(config).context("Failed to set up fetchers")?;

    let mut accepted = coordinator.accept_urls(&urls)?;
    if let Some(max_urls) = cli.max_urls {
        limit_batch(&mut accepted, max_urls as usize);
    }

    if cli.dry_run {
        handle_dry_run(&coordinator, &accepted);
    } else {
        let output = cli
            .output
            .unwrap_or_else(|| PathBuf::from(default_report_name(Local::now(), cli.format)));
        handle_extract(&coordinator, &accepted, cli.format, &output).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("contact_harvest=info,warn"),
            1 => EnvFilter::new("contact_harvest=debug,info"),
            2 => EnvFilter::new("contact_harvest=trace,debug"),
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

/// Loads the configuration file if one was given, defaults otherwise
fn load_configuration(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::info!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    Ok(config)
}

/// Reads one URL per line, skipping blank lines and `#` comments
fn read_url_list(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read URL list {}", path.display()))?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Keeps the first `max_urls` sites of an accepted batch
fn limit_batch(accepted: &mut Vec<String>, max_urls: usize) {
    if accepted.len() > max_urls {
        tracing::warn!(
            "Batch has {} URLs, only the first {} will be processed",
            accepted.len(),
            max_urls
        );
        accepted.truncate(max_urls);
    }
}

/// Handles the --dry-run mode: shows which pages would be probed
fn handle_dry_run(coordinator: &Coordinator, accepted: &[String]) {
    let config = coordinator.config();

    println!("=== Contact-Harvest Dry Run ===\n");

    println!("Fetching:");
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!("  Candidate page timeout: {}s", config.fetch.candidate_timeout_secs);
    println!("  Concurrency: {}", config.batch.concurrency);

    println!("\nBrowser Driver:");
    if config.renderer.enabled {
        println!(
            "  Command: {} {}",
            config.renderer.driver_path,
            config.renderer.resolved_driver_args().join(" ")
        );
        println!("  Endpoint: {}", config.renderer.endpoint());
    } else {
        println!("  Disabled (plain HTTP only)");
    }

    println!("\nSites ({}):", accepted.len());
    for url in accepted {
        println!("  - {}", url);
        for page in coordinator.pages().expand(url).iter().skip(1) {
            println!("    * {}", page.url);
        }
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would probe {} pages",
        accepted.len() * coordinator.pages().pages_per_site()
    );
}

/// Handles the main extraction run
///
/// The coordinator publishes the batch size to `progress` before the first
/// site starts, so an interrupted run reports the real total.
async fn handle_extract(
    coordinator: &Coordinator,
    urls: &[String],
    format: ReportFormat,
    output: &Path,
) -> anyhow::Result<()> {
    let progress = Arc::new(ProgressState::new());

    let results = tokio::select! {
        result = coordinator.process(urls, progress.as_ref()) => match result {
            Ok(results) => results,
            Err(e) => {
                tracing::error!("Extraction failed: {}", e);
                return Err(e.into());
            }
        },
        _ = tokio::signal::ctrl_c() => {
            bail!(
                "Interrupted after {} of {} sites",
                progress.processed(),
                progress.total()
            );
        }
    };

    save_report(&results, format, output)
        .with_context(|| format!("Failed to write report to {}", output.display()))?;

    let stats = BatchStatistics::from_results(&results);
    print_statistics(&stats);
    println!("\n✓ Report written to: {}", output.display());

    Ok(())
}
