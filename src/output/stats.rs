//! Crawl statistics
//!
//! The [`StatsAccumulator`] is shared between the coordinator and the
//! concurrently running page tasks; it is finalized once into an immutable
//! [`CrawlReport`].

use crate::state::{PageResult, PageStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Summary of one fetched page
#[derive(Debug, Clone, Serialize)]
pub struct PageSummary {
    pub url: String,
    pub depth: u32,
    pub status: PageStatus,
    pub external: bool,
    /// Valid links found on the page
    pub links_found: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageSummary {
    /// Builds a summary from a page result
    pub fn from_result(result: &PageResult) -> Self {
        Self {
            url: result.url.clone(),
            depth: result.depth,
            status: result.status,
            external: result.scope.is_external(),
            links_found: result.discovered_links.len(),
            error: result.error_detail(),
        }
    }
}

/// Aggregate results of one crawl run
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    /// Normalized seed URL
    pub seed_url: String,

    /// Pages fetched successfully
    pub pages_crawled: u64,

    /// Pages whose fetch failed
    pub pages_errored: u64,

    /// Failed pages that were HTTP 404 (or looked like one)
    pub pages_not_found: u64,

    /// Failed pages that were HTTP 403 (or looked like one)
    pub pages_forbidden: u64,

    /// Deepest depth of any fetched page
    pub max_depth_reached: u32,

    /// Fetched pages per depth
    pub pages_by_depth: BTreeMap<u32, u64>,

    /// Links dropped because they could not be normalized
    pub invalid_links: u64,

    /// External links not fetched because external links are excluded
    pub external_links_skipped: u64,

    /// Links to URLs already enqueued or fetched
    pub duplicate_links: u64,

    /// Links not followed because they would exceed the maximum depth
    pub links_beyond_depth: u64,

    /// Documents the output handler failed to write
    pub output_failures: u64,

    /// The run stopped early at the page cap
    pub budget_exceeded: bool,

    /// The run was cancelled or hit its deadline
    pub cancelled: bool,

    /// One entry per fetched page, layer by layer
    pub per_page: Vec<PageSummary>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    fn new(seed_url: &str) -> Self {
        let now = Utc::now();
        Self {
            seed_url: seed_url.to_string(),
            pages_crawled: 0,
            pages_errored: 0,
            pages_not_found: 0,
            pages_forbidden: 0,
            max_depth_reached: 0,
            pages_by_depth: BTreeMap::new(),
            invalid_links: 0,
            external_links_skipped: 0,
            duplicate_links: 0,
            links_beyond_depth: 0,
            output_failures: 0,
            budget_exceeded: false,
            cancelled: false,
            per_page: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    /// Total fetch attempts (successful and failed)
    pub fn pages_attempted(&self) -> u64 {
        self.pages_crawled + self.pages_errored
    }

    /// Wall-clock duration of the run in seconds
    pub fn elapsed_seconds(&self) -> f64 {
        (self.finished_at - self.started_at)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Percentage of attempted pages that succeeded
    pub fn success_rate(&self) -> f64 {
        let attempted = self.pages_attempted();
        if attempted == 0 {
            return 0.0;
        }
        (self.pages_crawled as f64 / attempted as f64) * 100.0
    }

    /// Returns the summary entry for a URL, if it was fetched
    pub fn page(&self, url: &str) -> Option<&PageSummary> {
        self.per_page.iter().find(|p| p.url == url)
    }

    /// Formats the report as a short markdown summary
    pub fn summary(&self, result_file: Option<&Path>) -> String {
        let mut md = String::new();

        md.push_str("## Crawl completed\n");
        md.push_str(&format!("- URL: {}\n", self.seed_url));
        if let Some(path) = result_file {
            md.push_str(&format!("- Result file: {}\n", path.display()));
        }
        md.push_str(&format!("- Duration: {:.2} seconds\n", self.elapsed_seconds()));
        md.push_str(&format!(
            "- Pages processed: {} attempted, {} successful, {} failed, {} not found (404), {} access forbidden (403)\n",
            self.pages_attempted(),
            self.pages_crawled,
            self.pages_errored,
            self.pages_not_found,
            self.pages_forbidden
        ));
        md.push_str(&format!("- Max depth reached: {}\n", self.max_depth_reached));
        md.push_str(&format!(
            "- Links: {} invalid, {} external skipped, {} duplicate, {} beyond max depth\n",
            self.invalid_links,
            self.external_links_skipped,
            self.duplicate_links,
            self.links_beyond_depth
        ));

        if self.budget_exceeded {
            md.push_str("- Stopped early: page budget reached\n");
        }
        if self.cancelled {
            md.push_str("- Stopped early: crawl cancelled, partial results kept\n");
        }
        if self.output_failures > 0 {
            md.push_str(&format!(
                "- Output failures: {} documents could not be written\n",
                self.output_failures
            ));
        }

        md
    }
}

/// Thread-safe, incrementally updated crawl statistics
#[derive(Debug)]
pub struct StatsAccumulator {
    report: Mutex<CrawlReport>,
}

impl StatsAccumulator {
    /// Starts collecting statistics for a run seeded at `seed_url`
    pub fn new(seed_url: &str) -> Self {
        Self {
            report: Mutex::new(CrawlReport::new(seed_url)),
        }
    }

    // Counters stay consistent even if a lock holder panicked
    fn lock(&self) -> MutexGuard<'_, CrawlReport> {
        self.report.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Counts a completed fetch attempt
    pub fn record_page(&self, result: &PageResult) {
        let mut report = self.lock();

        match result.status {
            PageStatus::Ok => report.pages_crawled += 1,
            PageStatus::Error => {
                report.pages_errored += 1;
                match result.error.as_ref().and_then(|e| e.status_code()) {
                    Some(404) => report.pages_not_found += 1,
                    Some(403) => report.pages_forbidden += 1,
                    _ => {}
                }
            }
        }

        report.max_depth_reached = report.max_depth_reached.max(result.depth);
        *report.pages_by_depth.entry(result.depth).or_insert(0) += 1;
    }

    /// Appends a page summary
    pub fn record_summary(&self, summary: PageSummary) {
        self.lock().per_page.push(summary);
    }

    pub fn record_invalid_link(&self) {
        self.lock().invalid_links += 1;
    }

    pub fn record_external_skipped(&self) {
        self.lock().external_links_skipped += 1;
    }

    pub fn record_duplicate_link(&self) {
        self.lock().duplicate_links += 1;
    }

    pub fn record_beyond_depth(&self) {
        self.lock().links_beyond_depth += 1;
    }

    pub fn record_output_failure(&self) {
        self.lock().output_failures += 1;
    }

    /// Flags that the page cap stopped the run
    pub fn mark_budget_exceeded(&self) {
        self.lock().budget_exceeded = true;
    }

    /// Flags that the run was cancelled
    pub fn mark_cancelled(&self) {
        self.lock().cancelled = true;
    }

    /// Copy of the statistics collected so far
    pub fn snapshot(&self) -> CrawlReport {
        self.lock().clone()
    }

    /// Stamps the finish time and returns the final report
    pub fn finish(&self) -> CrawlReport {
        let mut report = self.lock();
        report.finished_at = Utc::now();
        report.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{CrawlTarget, FetchError};
    use url::Url;

    fn target(path: &str, depth: u32) -> CrawlTarget {
        CrawlTarget::new(Url::parse(&format!("https://example.com{}", path)).unwrap(), depth)
    }

    #[test]
    fn test_counts_successes_and_errors() {
        let stats = StatsAccumulator::new("https://example.com/");
        stats.record_page(&PageResult::success(&target("/", 0), None, "a".to_string()));
        stats.record_page(&PageResult::success(&target("/a", 1), None, "b".to_string()));
        stats.record_page(&PageResult::failure(&target("/b", 1), FetchError::http_status(404)));
        stats.record_page(&PageResult::failure(&target("/c", 2), FetchError::http_status(403)));
        stats.record_page(&PageResult::failure(
            &target("/d", 2),
            FetchError::Timeout("slow".to_string()),
        ));

        let report = stats.finish();
        assert_eq!(report.pages_crawled, 2);
        assert_eq!(report.pages_errored, 3);
        assert_eq!(report.pages_attempted(), 5);
        assert_eq!(report.pages_not_found, 1);
        assert_eq!(report.pages_forbidden, 1);
        assert_eq!(report.max_depth_reached, 2);
        assert_eq!(report.pages_by_depth.get(&1), Some(&2));
        assert!((report.success_rate() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let stats = std::sync::Arc::new(StatsAccumulator::new("https://example.com/"));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let stats = stats.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        stats.record_invalid_link();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(stats.snapshot().invalid_links, 800);
    }

    #[test]
    fn test_empty_report() {
        let report = StatsAccumulator::new("https://example.com/").finish();
        assert_eq!(report.pages_attempted(), 0);
        assert_eq!(report.success_rate(), 0.0);
        assert!(report.finished_at >= report.started_at);
    }

    #[test]
    fn test_summary_text() {
        let stats = StatsAccumulator::new("https://example.com/");
        stats.record_page(&PageResult::success(&target("/", 0), None, "a".to_string()));
        stats.mark_budget_exceeded();
        let report = stats.finish();

        let summary = report.summary(Some(Path::new("out/crawl.md")));
        assert!(summary.contains("- URL: https://example.com/"));
        assert!(summary.contains("- Result file: out/crawl.md"));
        assert!(summary.contains("1 attempted, 1 successful, 0 failed"));
        assert!(summary.contains("page budget reached"));
        assert!(!summary.contains("cancelled"));
    }

    #[test]
    fn test_page_lookup() {
        let stats = StatsAccumulator::new("https://example.com/");
        let result = PageResult::success(&target("/", 0), None, "a".to_string());
        stats.record_summary(PageSummary::from_result(&result));
        let report = stats.finish();

        assert_eq!(report.page("https://example.com/").map(|p| p.depth), Some(0));
        assert!(report.page("https://example.com/missing").is_none());
    }
}
