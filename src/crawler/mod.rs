//! Crawler module for depth-bounded web crawling
//!
//! This module contains the core crawling logic, including:
//! - The frontier of pending (URL, depth) targets
//! - Page rendering over HTTP and HTML parsing
//! - Layer-by-layer crawl coordination
//!
//! [`crawl`] is the main entry point and wires the default HTTP renderer and
//! markdown output into a [`Coordinator`].

mod coordinator;
mod frontier;
mod parser;
mod renderer;

pub use coordinator::Coordinator;
pub use frontier::{Frontier, PushOutcome, VisitedSet};
pub use parser::{normalize_whitespace, parse_html, ParsedPage};
pub use renderer::{build_http_client, detect_soft_error, HttpRenderer, RenderedPage, Renderer};

use crate::config::{Config, CrawlRequest, CrawlSettings, OutputTarget};
use crate::output::{CrawlReport, MarkdownDirectoryHandler, MarkdownFileHandler, OutputHandler};
use crate::url::normalize_absolute;
use crate::CrawlError;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Result of a complete crawl invocation
#[derive(Debug, Clone, Serialize)]
pub struct CrawlOutcome {
    /// File (or directory, for per-page output) the documents were written to
    pub file_path: Option<PathBuf>,
    pub report: CrawlReport,
}

impl CrawlOutcome {
    /// Markdown summary of the run, including the result location
    pub fn summary(&self) -> String {
        self.report.summary(self.file_path.as_deref())
    }
}

/// Runs a complete crawl operation
///
/// This will:
/// 1. Combine the request with the configuration into run settings
/// 2. Build the HTTP renderer
/// 3. Crawl layer by layer from the seed URL
/// 4. Write the emitted documents and return the report
///
/// # Arguments
///
/// * `request` - Seed URL, depth and output parameters of this crawl
/// * `config` - Limits, user agent and output configuration
///
/// # Returns
///
/// * `Ok(CrawlOutcome)` - Crawl completed, possibly with page errors
/// * `Err(CrawlError)` - Invalid seed URL, or the output could not be written
pub async fn crawl(request: CrawlRequest, config: &Config) -> Result<CrawlOutcome, CrawlError> {
    crawl_with_cancellation(request, config, CancellationToken::new()).await
}

/// Runs a complete crawl that stops early when `cancel` is triggered
///
/// Pages fetched before cancellation are kept and written.
pub async fn crawl_with_cancellation(
    request: CrawlRequest,
    config: &Config,
    cancel: CancellationToken,
) -> Result<CrawlOutcome, CrawlError> {
    let settings = CrawlSettings::from_request(&request, config);

    let mut renderer = HttpRenderer::new(
        &config.user_agent,
        Duration::from_secs(config.crawler.request_timeout_secs),
    )?;

    // Without external links, redirects must stay on the seed's origin
    if !settings.include_external {
        if let Ok(seed) = normalize_absolute(&settings.seed_url) {
            renderer = renderer.with_redirect_origin(&seed);
        }
    }
    let renderer = Arc::new(renderer);

    let output: Arc<dyn OutputHandler> = match &settings.output_target {
        OutputTarget::SingleFile(path) => Arc::new(MarkdownFileHandler::new(path)),
        OutputTarget::Directory(dir) => Arc::new(MarkdownDirectoryHandler::new(dir)),
    };

    tracing::info!(
        "Results will be saved to: {}",
        settings.output_target.path().display()
    );

    let report = Coordinator::new(settings, renderer, output.clone())
        .with_cancellation(cancel)
        .run()
        .await?;

    let file_path = output.finish(&report)?;

    Ok(CrawlOutcome { file_path, report })
}
