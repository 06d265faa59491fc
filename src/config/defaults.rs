//! Default values for configuration

/// Default maximum crawl depth
pub fn default_max_depth() -> u32 {
    2
}

/// Default worker pool size for renderer calls
pub fn default_max_concurrent_pages_open() -> u32 {
    8
}

/// Default hard cap on pages fetched per run
pub fn default_max_pages() -> u32 {
    500
}

/// Default per-request timeout in seconds
pub fn default_request_timeout_secs() -> u64 {
    30
}

/// Default crawler name used in the User-Agent header
pub fn default_crawler_name() -> String {
    "depthcrawl".to_string()
}

/// Default crawler version used in the User-Agent header
pub fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Default directory for generated output files
pub fn default_output_directory() -> String {
    "crawl_results".to_string()
}

/// Default: sanitize emitted text to ASCII
pub fn default_sanitize_ascii() -> bool {
    true
}
