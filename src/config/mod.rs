//! Configuration module
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and turning a crawl request plus configuration into the read-only settings of
//! one crawl run.
//!
//! # Example
//!
//! ```no_run
//! use depthcrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("depthcrawl.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod defaults;
mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlRequest, CrawlSettings, CrawlerConfig, OutputConfig, OutputMode, OutputTarget,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
