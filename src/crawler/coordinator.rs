//! Crawler coordinator - layer-synchronized breadth-first crawl orchestration
//!
//! The coordinator owns the frontier for the duration of one run. Each depth
//! layer is taken from the frontier as a whole and dispatched to a bounded pool
//! of page tasks; the coordinator waits for every task of the layer before it
//! looks at the discovered links, so depth ordering stays exact even though
//! pages within a layer complete out of order.
//!
//! Page tasks normalize and classify their own links and count completed pages
//! through the shared [`StatsAccumulator`]. Frontier pushes and output writes
//! happen afterwards on the coordinator, in layer order and in the order links
//! appeared in their parent page.

use crate::config::CrawlSettings;
use crate::crawler::frontier::{Frontier, PushOutcome};
use crate::crawler::renderer::Renderer;
use crate::output::{
    CrawlReport, DocumentEmitter, OutputHandler, OutputRecord, PageSummary, StatsAccumulator,
};
use crate::state::{CrawlTarget, DiscoveredLink, FetchError, PageResult};
use crate::url::{classify, normalize, normalize_absolute, LinkScope};
use crate::CrawlError;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Logs per-page progress at info level for verbose runs, debug otherwise
macro_rules! page_log {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!($($arg)+);
        } else {
            tracing::debug!($($arg)+);
        }
    };
}

/// A page task's output, handed back to the coordinator at the layer barrier
struct FetchedPage {
    target: CrawlTarget,
    result: PageResult,
    record: OutputRecord,
    /// URL the page was served from, when a redirect moved it
    redirected_to: Option<Url>,
    /// Whether the page was served from outside the seed's origin
    served_external: bool,
    /// Valid links in document order
    links: Vec<(Url, LinkScope)>,
}

/// Run-wide inputs every page task needs
#[derive(Clone)]
struct PageContext {
    seed: Url,
    include_external: bool,
    verbose: bool,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    settings: CrawlSettings,
    renderer: Arc<dyn Renderer>,
    output: Arc<dyn OutputHandler>,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a coordinator for one crawl run
    ///
    /// # Arguments
    ///
    /// * `settings` - Read-only settings of the run
    /// * `renderer` - Fetches and renders single pages
    /// * `output` - Receives one record per fetched page, in crawl order
    pub fn new(
        settings: CrawlSettings,
        renderer: Arc<dyn Renderer>,
        output: Arc<dyn OutputHandler>,
    ) -> Self {
        Self {
            settings,
            renderer,
            output,
            cancel: CancellationToken::new(),
        }
    }

    /// Stops the run early when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The settings this coordinator runs with
    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    /// Runs the crawl to completion
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The crawl finished, stopped at the page budget, or
    ///   was cancelled; page failures are part of the report
    /// * `Err(CrawlError::InvalidSeed)` - The seed URL is not a valid HTTP(S)
    ///   URL; nothing was fetched
    pub async fn run(&self) -> Result<CrawlReport, CrawlError> {
        let seed = normalize_absolute(&self.settings.seed_url).map_err(|reason| {
            CrawlError::InvalidSeed {
                url: self.settings.seed_url.clone(),
                reason,
            }
        })?;

        tracing::info!(
            "Starting crawl of {} (max depth {}, include external {}, {} concurrent pages)",
            seed,
            self.settings.max_depth,
            self.settings.include_external,
            self.settings.max_concurrent
        );

        let stats = Arc::new(StatsAccumulator::new(seed.as_str()));
        let emitter = Arc::new(DocumentEmitter::new(
            stats.clone(),
            self.settings.sanitize_ascii,
        ));

        let mut frontier = Frontier::new(self.settings.max_depth);
        frontier.push(CrawlTarget::new(seed.clone(), 0));

        let cancel = self.cancel.child_token();
        let deadline = self.settings.deadline.map(|limit| {
            let token = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(limit).await;
                tracing::warn!("Crawl deadline of {:?} reached", limit);
                token.cancel();
            })
        });

        let mut pages_dispatched = 0usize;
        let mut cancelled = false;

        while let Some(depth) = frontier.current_depth() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let remaining = self.settings.max_pages.saturating_sub(pages_dispatched);
            if remaining == 0 {
                tracing::warn!(
                    "Page budget of {} reached with {} pages still queued",
                    self.settings.max_pages,
                    frontier.len()
                );
                stats.mark_budget_exceeded();
                break;
            }

            let mut layer = frontier.take_layer();
            if layer.len() > remaining {
                tracing::warn!(
                    "Page budget of {} reached, fetching {} of {} pages at depth {}",
                    self.settings.max_pages,
                    remaining,
                    layer.len(),
                    depth
                );
                layer.truncate(remaining);
                stats.mark_budget_exceeded();
            }

            pages_dispatched += layer.len();
            tracing::info!("Crawling depth {}: {} pages", depth, layer.len());

            let fetched = self.run_layer(layer, &seed, &emitter, &cancel).await;

            // Redirect targets count as fetched before any link of the layer is offered
            for page in fetched.iter().flatten() {
                if let Some(final_url) = &page.redirected_to {
                    frontier.mark_visited(final_url.as_str());
                }
            }

            for slot in fetched {
                match slot {
                    Some(page) => self.process_page(page, &mut frontier, &stats),
                    None => cancelled = true,
                }
            }

            tracing::info!(
                "Finished depth {}: {} pages queued for the next layer",
                depth,
                frontier.len()
            );
        }

        if let Some(handle) = deadline {
            handle.abort();
        }

        if cancelled {
            tracing::warn!("Crawl cancelled, returning partial results");
            stats.mark_cancelled();
        }

        let report = stats.finish();
        tracing::info!(
            "Crawl finished: {} pages crawled, {} errors, max depth {} in {:.2}s",
            report.pages_crawled,
            report.pages_errored,
            report.max_depth_reached,
            report.elapsed_seconds()
        );

        Ok(report)
    }

    /// Fetches every target of a layer with at most `max_concurrent` renderer
    /// calls in flight, and returns the pages in layer order
    ///
    /// A `None` slot is a target that was not fetched because the run was
    /// cancelled first. A task that panicked is reported as a failed page.
    async fn run_layer(
        &self,
        layer: Vec<CrawlTarget>,
        seed: &Url,
        emitter: &Arc<DocumentEmitter>,
        cancel: &CancellationToken,
    ) -> Vec<Option<FetchedPage>> {
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrent));
        let context = PageContext {
            seed: seed.clone(),
            include_external: self.settings.include_external,
            verbose: self.settings.verbose,
        };

        let mut slots: Vec<LayerSlot> = Vec::with_capacity(layer.len());
        slots.resize_with(layer.len(), || LayerSlot::Pending);

        let mut tasks = JoinSet::new();
        for (index, target) in layer.iter().cloned().enumerate() {
            let semaphore = semaphore.clone();
            let renderer = self.renderer.clone();
            let emitter = emitter.clone();
            let cancel = cancel.clone();
            let context = context.clone();

            tasks.spawn(async move {
                let permit = tokio::select! {
                    _ = cancel.cancelled() => return (index, None),
                    permit = semaphore.acquire_owned() => permit,
                };
                let Ok(_permit) = permit else {
                    return (index, None);
                };

                let page = fetch_page(renderer.as_ref(), target, &context, &emitter, &cancel).await;
                (index, page)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Some(page))) => slots[index] = LayerSlot::Fetched(page),
                Ok((index, None)) => slots[index] = LayerSlot::Cancelled,
                Err(e) => tracing::error!("Page task failed: {}", e),
            }
        }

        slots
            .into_iter()
            .zip(layer)
            .map(|(slot, target)| match slot {
                LayerSlot::Fetched(page) => Some(page),
                LayerSlot::Cancelled => None,
                LayerSlot::Pending => Some(failed_task_page(target, emitter)),
            })
            .collect()
    }

    /// Records a fetched page and offers its links to the frontier
    fn process_page(&self, page: FetchedPage, frontier: &mut Frontier, stats: &StatsAccumulator) {
        let FetchedPage {
            target,
            result,
            record,
            served_external,
            links,
            ..
        } = page;

        if let Err(e) = self.output.record(&record) {
            tracing::warn!("Failed to write output for {}: {}", result.url, e);
            stats.record_output_failure();
        }
        stats.record_summary(PageSummary::from_result(&result));

        if !result.is_ok() {
            return;
        }

        // External pages are recorded but not expanded
        let external = target.scope.is_external() || served_external;
        if external && !self.settings.expand_external {
            return;
        }

        let next_depth = target.depth + 1;
        for (url, scope) in links {
            if scope.is_external() && !self.settings.include_external {
                stats.record_external_skipped();
                continue;
            }

            match frontier.try_push(CrawlTarget::with_scope(url, next_depth, scope)) {
                PushOutcome::Queued => {}
                PushOutcome::Duplicate => stats.record_duplicate_link(),
                PushOutcome::TooDeep => stats.record_beyond_depth(),
            }
        }
    }
}

/// Where a layer target ended up once every task of the layer has joined
enum LayerSlot {
    /// The task never reported back
    Pending,
    Fetched(FetchedPage),
    Cancelled,
}

/// Page error for a target whose task panicked
fn failed_task_page(target: CrawlTarget, emitter: &DocumentEmitter) -> FetchedPage {
    let result = PageResult::failure(
        &target,
        FetchError::Render("page task terminated unexpectedly".to_string()),
    );
    let record = emitter.emit(&result);

    FetchedPage {
        target,
        result,
        record,
        redirected_to: None,
        served_external: false,
        links: Vec::new(),
    }
}

/// Renders one target and turns the outcome into a page result
///
/// Returns `None` if the run is cancelled before the renderer call completes.
async fn fetch_page(
    renderer: &dyn Renderer,
    target: CrawlTarget,
    context: &PageContext,
    emitter: &DocumentEmitter,
    cancel: &CancellationToken,
) -> Option<FetchedPage> {
    if cancel.is_cancelled() {
        return None;
    }

    let verbose = context.verbose;
    page_log!(verbose, "Visiting {} (depth {})", target.url, target.depth);

    let rendered = tokio::select! {
        biased;
        _ = cancel.cancelled() => return None,
        rendered = renderer.render(&target.url) => rendered,
    };

    // A redirect off the seed's origin must not bring external content in
    let rendered = rendered.and_then(|page| {
        let served_external = classify(&page.final_url, &context.seed).is_external();
        if served_external && !target.scope.is_external() && !context.include_external {
            Err(FetchError::Redirect(format!(
                "{} redirects outside the crawled origin to {}",
                target.url, page.final_url
            )))
        } else {
            Ok((page, served_external))
        }
    });

    let mut redirected_to = None;
    let mut served_external = false;

    let (result, links) = match rendered {
        Ok((page, external)) => {
            served_external = external;
            let final_url =
                normalize(page.final_url.as_str(), &page.final_url).unwrap_or_else(|_| page.final_url.clone());
            if final_url != target.url {
                redirected_to = Some(final_url);
            }

            let mut links = Vec::with_capacity(page.links.len());
            for raw in &page.links {
                match normalize(raw, &page.final_url) {
                    Ok(url) => {
                        let scope = classify(&url, &context.seed);
                        links.push((url, scope));
                    }
                    Err(e) => {
                        tracing::debug!("Dropping link {:?} on {}: {}", raw, target.url, e);
                        emitter.stats().record_invalid_link();
                    }
                }
            }

            let mut result = PageResult::success(&target, page.title, page.text);
            result.discovered_links = links
                .iter()
                .map(|(url, scope)| DiscoveredLink {
                    url: url.to_string(),
                    is_external: scope.is_external(),
                })
                .collect();

            page_log!(
                verbose,
                "Crawled {} (depth {}): {} links",
                target.url,
                target.depth,
                links.len()
            );
            (result, links)
        }
        Err(e) => {
            page_log!(verbose, "Failed {} (depth {}): {}", target.url, target.depth, e);
            (PageResult::failure(&target, e), Vec::new())
        }
    };

    let record = emitter.emit(&result);

    Some(FetchedPage {
        target,
        result,
        record,
        redirected_to,
        served_external,
        links,
    })
}
