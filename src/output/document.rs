//! Document emitter: one structured output record per fetched page
//!
//! Record layout:
//!
//! ```text
//! # <page URL>
//!
//! ## Metadata
//! - Depth: <integer>
//! - Timestamp: <ISO-8601>
//!
//! ## Content
//! <extracted text>
//!
//! ---
//! ```
//!
//! Failed pages carry an `## Error` section with the error summary instead of
//! `## Content`.

use crate::output::sanitize::sanitize_text;
use crate::output::stats::StatsAccumulator;
use crate::state::{PageResult, PageStatus};
use chrono::SecondsFormat;
use serde::Serialize;
use std::sync::Arc;

/// Body section of an output record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "text")]
pub enum RecordBody {
    /// Extracted content of a successful page
    Content(String),
    /// Error summary of a failed page
    Error(String),
}

/// Structured output for one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRecord {
    pub url: String,
    pub depth: u32,
    /// ISO-8601 timestamp of the fetch
    pub timestamp: String,
    pub title: Option<String>,
    pub body: RecordBody,
}

impl OutputRecord {
    /// Returns true for records of failed pages
    pub fn is_error(&self) -> bool {
        matches!(self.body, RecordBody::Error(_))
    }

    /// Renders the record as a markdown section
    pub fn to_markdown(&self) -> String {
        let (heading, text) = match &self.body {
            RecordBody::Content(text) => ("Content", text),
            RecordBody::Error(text) => ("Error", text),
        };

        format!(
            "# {}\n\n## Metadata\n- Depth: {}\n- Timestamp: {}\n\n## {}\n{}\n\n---\n",
            self.url, self.depth, self.timestamp, heading, text
        )
    }
}

/// Converts page results into output records and counts them
pub struct DocumentEmitter {
    stats: Arc<StatsAccumulator>,
    sanitize_ascii: bool,
}

impl DocumentEmitter {
    /// Creates an emitter that updates `stats` for every emitted page
    pub fn new(stats: Arc<StatsAccumulator>, sanitize_ascii: bool) -> Self {
        Self {
            stats,
            sanitize_ascii,
        }
    }

    /// The statistics this emitter updates
    pub fn stats(&self) -> &Arc<StatsAccumulator> {
        &self.stats
    }

    /// Builds the output record for a page and counts it
    ///
    /// Safe to call concurrently from several page tasks.
    pub fn emit(&self, result: &PageResult) -> OutputRecord {
        self.stats.record_page(result);

        let body = match result.status {
            PageStatus::Ok => RecordBody::Content(self.clean(result.content.as_deref().unwrap_or(""))),
            PageStatus::Error => RecordBody::Error(
                self.clean(&result.error_detail().unwrap_or_else(|| "Unknown error".to_string())),
            ),
        };

        OutputRecord {
            url: self.clean(&result.url),
            depth: result.depth,
            timestamp: result.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            title: result.title.as_deref().map(|t| self.clean(t)),
            body,
        }
    }

    fn clean(&self, text: &str) -> String {
        if self.sanitize_ascii {
            sanitize_text(text)
        } else {
            text.to_string()
        }
    }
}
