//! Output handler trait and types
//!
//! An output handler receives the emitted records of a run in crawl order and
//! is finalized once the report is complete.

use crate::output::document::OutputRecord;
use crate::output::stats::CrawlReport;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output to {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for emitted documents
pub trait OutputHandler: Send + Sync {
    /// Accepts one page record
    fn record(&self, record: &OutputRecord) -> OutputResult<()>;

    /// Completes the output after the crawl; returns the written path, if any
    fn finish(&self, report: &CrawlReport) -> OutputResult<Option<PathBuf>>;
}

/// Output handler that keeps records in memory
#[derive(Debug, Default)]
pub struct MemoryOutputHandler {
    records: Mutex<Vec<OutputRecord>>,
}

impl MemoryOutputHandler {
    /// Creates an empty handler
    pub fn new() -> Self {
        Self::default()
    }

    /// Records received so far, in the order they were recorded
    pub fn records(&self) -> Vec<OutputRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// All records rendered as one markdown document
    pub fn to_markdown(&self) -> String {
        self.records()
            .iter()
            .map(OutputRecord::to_markdown)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputHandler for MemoryOutputHandler {
    fn record(&self, record: &OutputRecord) -> OutputResult<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    fn finish(&self, _report: &CrawlReport) -> OutputResult<Option<PathBuf>> {
        Ok(None)
    }
}
