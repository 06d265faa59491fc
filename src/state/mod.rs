//! State module for data flowing through a crawl
//!
//! # Components
//!
//! - `CrawlTarget`: a (URL, depth) pair accepted into the frontier
//! - `PageResult`: the outcome of one renderer call
//! - `FetchError`: why a page failed

mod page_result;

// Re-export main types
pub use page_result::{CrawlTarget, DiscoveredLink, FetchError, PageResult, PageStatus};
