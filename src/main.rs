//! Site-Scribe main entry point
//!
//! This is the command-line interface for the Site-Scribe crawler. Logs go
//! to stderr; stdout carries only `PROGRESS_UPDATE:` lines.

use anyhow::{Context, Result};
use clap::Parser;
use site_scribe::config::{build_job, load_config_with_hash, Config, JobOverrides, OutputFormat};
use site_scribe::crawler::run_crawl;
use site_scribe::progress::CrawlEvent;
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Capacity of the progress channel; updates beyond it are dropped
const EVENT_BUFFER: usize = 64;

/// Site-Scribe: crawl one website into markdown, HTML or JSON files
///
/// Site-Scribe stays on the seed URL's hostname, converts every page it
/// reaches and checkpoints its progress so an interrupted crawl can be
/// resumed by running the same command again.
#[derive(Parser, Debug)]
#[command(name = "site-scribe")]
#[command(version = "1.0.0")]
#[command(about = "A resumable single-site crawler", long_about = None)]
struct Cli {
    /// Seed URL
    #[arg(value_name = "URL", required_unless_present = "url_flag")]
    url: Option<String>,

    /// Seed URL (alternative to the positional argument)
    #[arg(short = 'u', long = "url", value_name = "URL", conflicts_with = "url")]
    url_flag: Option<String>,

    /// Output directory (default: data/tasks/<domain>/<timestamp>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Page file format
    #[arg(short, long, value_parser = parse_format)]
    format: Option<OutputFormat>,

    /// Save images under assets/ and link them locally
    #[arg(long)]
    download_images: bool,

    /// Maximum number of URLs to crawl
    #[arg(long)]
    max_pages: Option<usize>,

    /// Number of pages fetched concurrently
    #[arg(long)]
    concurrency: Option<usize>,

    /// URL notified with a POST when the crawl completes
    #[arg(long)]
    webhook: Option<String>,

    /// Verbose per-URL diagnostics
    #[arg(long)]
    debug: bool,

    /// List the URLs that would be crawled without fetching or writing anything
    #[arg(long)]
    dry_run: bool,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn parse_format(raw: &str) -> std::result::Result<OutputFormat, String> {
    raw.parse()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet, cli.debug);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    let seed = cli
        .url
        .clone()
        .or_else(|| cli.url_flag.clone())
        .context("A seed URL is required")?;

    let overrides = JobOverrides {
        output_dir: cli.output.clone(),
        format: cli.format,
        download_images: cli.download_images,
        max_pages: cli.max_pages,
        concurrency: cli.concurrency,
        webhook: cli.webhook.clone(),
        dry_run: cli.dry_run,
        debug: cli.debug,
    };
    let job = build_job(&seed, config, overrides).context("Invalid crawl settings")?;

    tracing::info!(
        "Crawling {} into {} ({} format, max {} pages, concurrency {})",
        job.seed,
        job.output_dir.display(),
        job.format,
        job.max_pages,
        job.concurrency
    );

    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let printer = tokio::spawn(print_events(rx));

    let result = run_crawl(job, Some(tx)).await;
    // The sender is dropped with the crawl, which ends the printer
    if let Err(e) = printer.await {
        tracing::warn!("Progress printer stopped: {}", e);
    }

    match result {
        Ok(summary) => {
            tracing::info!(
                "Crawl completed: {} pages written, {} failed, output in {}",
                summary.successful_pages,
                summary.failed_pages,
                summary.output_dir.display()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// `RUST_LOG`, when set, takes precedence.
fn setup_logging(verbose: u8, quiet: bool, debug: bool) {
    let default_filter = if quiet {
        "error"
    } else {
        match (verbose, debug) {
            (0, false) => "site_scribe=info,warn",
            (0, true) | (1, _) => "site_scribe=debug,info",
            (2, _) => "site_scribe=trace,debug",
            _ => "trace",
        }
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Prints progress lines on stdout until the crawl drops its sender
async fn print_events(mut rx: mpsc::Receiver<CrawlEvent>) {
    let mut stdout = std::io::stdout();

    while let Some(event) = rx.recv().await {
        match event {
            CrawlEvent::Progress(progress) => {
                if writeln!(stdout, "{}", progress.to_line())
                    .and_then(|_| stdout.flush())
                    .is_err()
                {
                    tracing::debug!("stdout closed, no more progress lines");
                    return;
                }
            }
            CrawlEvent::DryRunUrl(url) => eprintln!("[dry-run] {}", url),
            CrawlEvent::Completed(summary) => {
                tracing::debug!("Completion event for {}", summary.domain)
            }
        }
    }
}
