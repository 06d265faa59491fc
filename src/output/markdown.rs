//! Markdown output handlers and output path generation

use crate::output::document::OutputRecord;
use crate::output::stats::CrawlReport;
use crate::output::traits::{OutputError, OutputHandler, OutputResult};
use crate::url::host_slug;
use chrono::{DateTime, TimeZone};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use url::Url;

/// Maximum length of the path-derived part of a per-page file name
const MAX_SLUG_LEN: usize = 80;

/// Generates the default single-file output path for a seed URL
///
/// Format: `<directory>/crawl_<host>_<YYYYmmdd_HHMMSS>.md`, where dots in the
/// host become underscores.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use depthcrawl::output::default_output_path;
/// use std::path::{Path, PathBuf};
///
/// let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
/// let path = default_output_path(Path::new("crawl_results"), "https://docs.example.com/", now);
/// assert_eq!(path, PathBuf::from("crawl_results/crawl_docs_example_com_20240309_140500.md"));
/// ```
pub fn default_output_path<Tz: TimeZone>(directory: &Path, seed_url: &str, now: DateTime<Tz>) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    directory.join(format!("{}.md", run_stem(seed_url, now)))
}

/// Generates the default per-page output directory for a seed URL
pub fn default_output_dir<Tz: TimeZone>(directory: &Path, seed_url: &str, now: DateTime<Tz>) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    directory.join(run_stem(seed_url, now))
}

fn run_stem<Tz: TimeZone>(seed_url: &str, now: DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let host = Url::parse(seed_url.trim())
        .map(|url| host_slug(&url))
        .unwrap_or_else(|_| "unknown".to_string());

    format!("crawl_{}_{}", host, now.format("%Y%m%d_%H%M%S"))
}

/// File name for the `index`-th page of a per-page run
///
/// # Example
///
/// ```
/// use depthcrawl::output::page_file_name;
///
/// assert_eq!(page_file_name(3, "https://example.com/docs/intro?x=1"), "0003_example_com_docs_intro_x_1.md");
/// assert_eq!(page_file_name(0, "https://example.com/"), "0000_example_com.md");
/// ```
pub fn page_file_name(index: usize, url: &str) -> String {
    let stripped = url
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(url);

    let mut slug = String::with_capacity(stripped.len());
    for c in stripped.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' };
        if c == '_' && slug.ends_with('_') {
            continue;
        }
        slug.push(c);
    }

    let slug: String = slug.trim_matches('_').chars().take(MAX_SLUG_LEN).collect();
    format!("{:04}_{}.md", index, slug)
}

fn create_parent_dir(path: &Path) -> OutputResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn write_file(path: &Path, content: &str) -> OutputResult<()> {
    create_parent_dir(path)?;
    fs::write(path, content).map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes every page of a run into one markdown file
///
/// Sections are buffered in crawl order and written when the run finishes, so
/// a crawl that fails on its seed leaves no file behind.
pub struct MarkdownFileHandler {
    path: PathBuf,
    buffer: Mutex<String>,
}

impl MarkdownFileHandler {
    /// Creates a handler writing to `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            buffer: Mutex::new(String::new()),
        }
    }

    /// The file this handler writes
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn buffer(&self) -> MutexGuard<'_, String> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OutputHandler for MarkdownFileHandler {
    fn record(&self, record: &OutputRecord) -> OutputResult<()> {
        let mut buffer = self.buffer();
        if !buffer.is_empty() {
            buffer.push('\n');
        }
        buffer.push_str(&record.to_markdown());
        Ok(())
    }

    fn finish(&self, report: &CrawlReport) -> OutputResult<Option<PathBuf>> {
        let content = self.buffer().clone();
        tracing::info!(
            "Writing {} page sections to {}",
            report.pages_attempted(),
            self.path.display()
        );
        write_file(&self.path, &content)?;
        Ok(Some(self.path.clone()))
    }
}

/// Writes one markdown file per page into a directory
///
/// Files are written as records arrive; a run summary is written to
/// `summary.md` when the run finishes.
pub struct MarkdownDirectoryHandler {
    directory: PathBuf,
    next_index: Mutex<usize>,
}

impl MarkdownDirectoryHandler {
    /// Creates a handler writing into `directory`
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            next_index: Mutex::new(0),
        }
    }

    /// The directory this handler writes into
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl OutputHandler for MarkdownDirectoryHandler {
    fn record(&self, record: &OutputRecord) -> OutputResult<()> {
        let index = {
            let mut next = self.next_index.lock().unwrap_or_else(PoisonError::into_inner);
            let index = *next;
            *next += 1;
            index
        };

        let path = self.directory.join(page_file_name(index, &record.url));
        write_file(&path, &record.to_markdown())
    }

    fn finish(&self, report: &CrawlReport) -> OutputResult<Option<PathBuf>> {
        let summary_path = self.directory.join("summary.md");
        write_file(&summary_path, &report.summary(Some(&self.directory)))?;
        Ok(Some(self.directory.clone()))
    }
}
