//! Depthcrawl: a depth-bounded web crawl orchestrator
//!
//! This crate crawls a site breadth-first from a seed URL up to a maximum depth,
//! classifies every discovered link as internal or external to the seed's origin,
//! extracts readable content and emits one markdown document per page together
//! with aggregate crawl statistics.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for crawl operations
///
/// Only [`CrawlError::InvalidSeed`] is produced by the orchestrator itself; every
/// per-page and per-link failure is captured in the crawl report instead.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Invalid seed URL '{url}': {reason}")]
    InvalidSeed { url: String, reason: UrlError },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
///
/// A link failing normalization with one of these is dropped from the frontier
/// and counted as an invalid link.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("Empty URL")]
    Empty,
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, CrawlRequest, CrawlSettings};
pub use crawler::{crawl, CrawlOutcome, Coordinator, HttpRenderer, Renderer};
pub use output::CrawlReport;
pub use state::{CrawlTarget, PageResult, PageStatus};
pub use url::{classify, normalize, LinkScope};
