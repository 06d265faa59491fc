use crate::config::defaults::*;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure, loaded from an optional TOML file
///
/// Every section and key has a default, so an empty file (or no file at all)
/// yields a usable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum depth to crawl from the seed URL (0 = seed page only)
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Whether external-origin links are fetched and recorded
    #[serde(default)]
    pub include_external: bool,

    /// Whether links found on external pages are followed further
    #[serde(default)]
    pub expand_external: bool,

    /// Maximum number of concurrent renderer calls within a layer
    #[serde(default = "default_max_concurrent_pages_open")]
    pub max_concurrent_pages_open: u32,

    /// Hard cap on the number of pages fetched in one run
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,

    /// Optional deadline for the whole run (seconds)
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Timeout for a single page request (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            include_external: false,
            expand_external: false,
            max_concurrent_pages_open: default_max_concurrent_pages_open(),
            max_pages: default_max_pages(),
            timeout_secs: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(default)]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// How emitted documents are laid out on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// One markdown file per crawl run, one section per page
    #[default]
    SingleFile,
    /// One markdown file per page inside a directory
    PerPage,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory used for generated output paths
    #[serde(default = "default_output_directory")]
    pub directory: String,

    /// Single file or one file per page
    #[serde(default)]
    pub mode: OutputMode,

    /// Replace typographic characters with ASCII and drop other non-ASCII text
    #[serde(default = "default_sanitize_ascii")]
    pub sanitize_ascii: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            mode: OutputMode::default(),
            sanitize_ascii: default_sanitize_ascii(),
        }
    }
}

/// A single crawl invocation: `crawl(url, max_depth = 2, include_external = false,
/// verbose = true, output_file = None)`
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    /// Seed URL to start from
    pub url: String,
    /// Maximum crawl depth
    pub max_depth: u32,
    /// Whether external links are fetched and recorded
    pub include_external: bool,
    /// Log every page visit at info level
    pub verbose: bool,
    /// Output path; generated from the seed host and time when absent
    pub output_file: Option<PathBuf>,
}

impl CrawlRequest {
    /// Creates a request for `url` with the default parameters
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

impl Default for CrawlRequest {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_depth: default_max_depth(),
            include_external: false,
            verbose: true,
            output_file: None,
        }
    }
}

/// Where the emitted documents of one run end up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// All page sections concatenated into one markdown file
    SingleFile(PathBuf),
    /// One markdown file per page in this directory
    Directory(PathBuf),
}

impl OutputTarget {
    /// The file or directory path of this target
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::SingleFile(path) | Self::Directory(path) => path,
        }
    }
}

/// Read-only settings for one crawl run
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// Seed URL as given by the caller (validated when the run starts)
    pub seed_url: String,
    /// Maximum crawl depth (0 = seed page only)
    pub max_depth: u32,
    /// Fetch and record external-origin links
    pub include_external: bool,
    /// Follow links found on external pages
    pub expand_external: bool,
    /// Log every page visit at info level
    pub verbose: bool,
    /// Worker pool size for renderer calls within a layer
    pub max_concurrent: usize,
    /// Hard cap on fetched pages
    pub max_pages: usize,
    /// Optional deadline for the whole run
    pub deadline: Option<Duration>,
    /// Destination of emitted documents
    pub output_target: OutputTarget,
    /// Reduce emitted text to ASCII
    pub sanitize_ascii: bool,
}

impl CrawlSettings {
    /// Creates settings for `seed_url` using default limits and output target
    pub fn new(seed_url: impl Into<String>) -> Self {
        Self::from_request(&CrawlRequest::new(seed_url), &Config::default())
    }

    /// Combines a crawl request with the file configuration
    ///
    /// The request's parameters win; everything else comes from `config`.
    pub fn from_request(request: &CrawlRequest, config: &Config) -> Self {
        let directory = PathBuf::from(&config.output.directory);

        let output_target = match (&request.output_file, config.output.mode) {
            (Some(path), OutputMode::SingleFile) => OutputTarget::SingleFile(path.clone()),
            (Some(path), OutputMode::PerPage) => OutputTarget::Directory(path.clone()),
            (None, OutputMode::SingleFile) => OutputTarget::SingleFile(
                crate::output::default_output_path(&directory, &request.url, chrono::Local::now()),
            ),
            (None, OutputMode::PerPage) => OutputTarget::Directory(
                crate::output::default_output_dir(&directory, &request.url, chrono::Local::now()),
            ),
        };

        Self {
            seed_url: request.url.clone(),
            max_depth: request.max_depth,
            include_external: request.include_external,
            expand_external: config.crawler.expand_external,
            verbose: request.verbose,
            max_concurrent: config.crawler.max_concurrent_pages_open.max(1) as usize,
            max_pages: config.crawler.max_pages.max(1) as usize,
            deadline: config.crawler.timeout_secs.map(Duration::from_secs),
            output_target,
            sanitize_ascii: config.output.sanitize_ascii,
        }
    }
}
