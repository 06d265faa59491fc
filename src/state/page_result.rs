//! Per-page crawl data: targets awaiting a fetch and the results of fetching them

use crate::url::LinkScope;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use url::Url;

/// A URL accepted into the frontier, to be fetched exactly once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    /// Normalized URL
    pub url: Url,
    /// Number of link hops from the seed (seed = 0)
    pub depth: u32,
    /// Whether the URL shares the seed's origin
    pub scope: LinkScope,
}

impl CrawlTarget {
    /// Creates a target for an internal URL
    pub fn new(url: Url, depth: u32) -> Self {
        Self {
            url,
            depth,
            scope: LinkScope::Internal,
        }
    }

    /// Creates a target with an explicit scope
    pub fn with_scope(url: Url, depth: u32, scope: LinkScope) -> Self {
        Self { url, depth, scope }
    }
}

/// Outcome of a single fetch attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    Ok,
    Error,
}

/// A link found in a fetched page, after normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredLink {
    pub url: String,
    pub is_external: bool,
}

/// Why a page could not be fetched or rendered
///
/// All variants are reported uniformly as a page error; the variant only
/// refines the statistics and the error summary text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("DNS resolution failed: {0}")]
    Dns(String),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("HTTP {status}: {reason}")]
    HttpStatus { status: u16, reason: String },

    #[error("Redirect not followed: {0}")]
    Redirect(String),

    #[error("Unsupported content type: {0}")]
    ContentType(String),

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Render failed: {0}")]
    Render(String),
}

impl FetchError {
    /// Builds an HTTP status error with the canonical reason phrase
    pub fn http_status(status: u16) -> Self {
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown status")
            .to_string();
        Self::HttpStatus { status, reason }
    }

    /// HTTP status code, for HTTP status errors
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Everything learned from one renderer call
#[derive(Debug, Clone)]
pub struct PageResult {
    pub url: String,
    pub depth: u32,
    pub scope: LinkScope,
    pub status: PageStatus,
    /// Page title, when the page had one
    pub title: Option<String>,
    /// Extracted readable text (successful pages only)
    pub content: Option<String>,
    /// Links in the order they appear in the page body
    pub discovered_links: Vec<DiscoveredLink>,
    pub error: Option<FetchError>,
    pub timestamp: DateTime<Utc>,
}

impl PageResult {
    /// Result for a page that was fetched and rendered
    pub fn success(target: &CrawlTarget, title: Option<String>, content: String) -> Self {
        Self {
            url: target.url.to_string(),
            depth: target.depth,
            scope: target.scope,
            status: PageStatus::Ok,
            title,
            content: Some(content),
            discovered_links: Vec::new(),
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Result for a page whose fetch failed
    pub fn failure(target: &CrawlTarget, error: FetchError) -> Self {
        Self {
            url: target.url.to_string(),
            depth: target.depth,
            scope: target.scope,
            status: PageStatus::Error,
            title: None,
            content: None,
            discovered_links: Vec::new(),
            error: Some(error),
            timestamp: Utc::now(),
        }
    }

    /// Returns true if the page was fetched successfully
    pub fn is_ok(&self) -> bool {
        self.status == PageStatus::Ok
    }

    /// Human-readable error summary, for failed pages
    pub fn error_detail(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }
}
