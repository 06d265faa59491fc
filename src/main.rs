//! Depthcrawl main entry point
//!
//! This is the command-line interface for the depth-bounded web crawler.

use anyhow::Context;
use clap::Parser;
use depthcrawl::config::{load_config_with_hash, validate, Config, CrawlRequest, OutputMode};
use depthcrawl::crawler::crawl_with_cancellation;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Depthcrawl: a depth-bounded web crawler
///
/// Crawls a site breadth-first from a seed URL up to a maximum depth and writes
/// the readable content of every page to markdown.
#[derive(Parser, Debug)]
#[command(name = "depthcrawl")]
#[command(version = "1.0.0")]
#[command(about = "A depth-bounded web crawler", long_about = None)]
struct Cli {
    /// Seed URL to start crawling from
    #[arg(value_name = "URL")]
    url: String,

    /// Maximum crawl depth (0 = seed page only)
    #[arg(short = 'd', long)]
    max_depth: Option<u32>,

    /// Fetch and record links to other origins
    #[arg(long)]
    include_external: bool,

    /// Follow links found on external pages
    #[arg(long)]
    expand_external: bool,

    /// Output file (or directory with --per-page)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Write one markdown file per page
    #[arg(long)]
    per_page: bool,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Maximum number of pages fetched concurrently
    #[arg(long)]
    concurrency: Option<u32>,

    /// Maximum number of pages fetched in total
    #[arg(long)]
    max_pages: Option<u32>,

    /// Stop the crawl after this many seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print the crawl report as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    apply_overrides(&mut config, &cli);
    validate(&config).context("invalid crawl options")?;

    let request = CrawlRequest {
        url: cli.url.clone(),
        max_depth: config.crawler.max_depth,
        include_external: config.crawler.include_external,
        verbose: !cli.quiet,
        output_file: cli.output.clone(),
    };

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing with partial results");
            interrupt.cancel();
        }
    });

    let outcome = crawl_with_cancellation(request, &config, cancel)
        .await
        .with_context(|| format!("crawl of {} failed", cli.url))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", outcome.summary());
    }

    Ok(())
}

/// Applies command-line options on top of the file configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(depth) = cli.max_depth {
        config.crawler.max_depth = depth;
    }
    if cli.include_external {
        config.crawler.include_external = true;
    }
    if cli.expand_external {
        config.crawler.expand_external = true;
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawler.max_concurrent_pages_open = concurrency;
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if let Some(timeout) = cli.timeout {
        config.crawler.timeout_secs = Some(timeout);
    }
    if cli.per_page {
        config.output.mode = OutputMode::PerPage;
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("depthcrawl=info,warn"),
            1 => EnvFilter::new("depthcrawl=debug,info"),
            2 => EnvFilter::new("depthcrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
