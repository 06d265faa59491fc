//! Output module for emitted documents and crawl statistics
//!
//! This module handles:
//! - Converting page results into markdown output records
//! - Accumulating crawl statistics into the final report
//! - Writing records to a single file, a directory, or memory
//! - ASCII sanitation of emitted text

mod document;
mod markdown;
mod sanitize;
pub mod stats;
mod traits;

pub use document::{DocumentEmitter, OutputRecord, RecordBody};
pub use markdown::{
    default_output_dir, default_output_path, page_file_name, MarkdownDirectoryHandler,
    MarkdownFileHandler,
};
pub use sanitize::sanitize_text;
pub use stats::{CrawlReport, PageSummary, StatsAccumulator};
pub use traits::{MemoryOutputHandler, OutputError, OutputHandler, OutputResult};
