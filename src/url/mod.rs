//! URL handling module
//!
//! This module provides URL normalization, host extraction and the
//! internal/external classification of links relative to the seed's origin.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{extract_host, host_slug};
pub use normalize::{normalize, normalize_absolute};

use serde::Serialize;
use url::Url;

/// Scope of a link relative to the seed page's origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkScope {
    /// Same scheme, host and port as the seed
    Internal,
    /// Any other origin
    External,
}

impl LinkScope {
    /// Returns true for links outside the seed's origin
    pub fn is_external(&self) -> bool {
        matches!(self, Self::External)
    }
}

/// Classifies a URL as internal or external to the seed's origin
///
/// Origin equality is scheme + host + port, with default ports made explicit,
/// so `https://example.com` and `https://example.com:443` share an origin while
/// `http://example.com` and `https://sub.example.com` do not.
///
/// # Examples
///
/// ```
/// use depthcrawl::url::{classify, LinkScope};
/// use url::Url;
///
/// let seed = Url::parse("https://example.com/").unwrap();
/// let link = Url::parse("https://example.com:443/about").unwrap();
/// assert_eq!(classify(&link, &seed), LinkScope::Internal);
///
/// let link = Url::parse("https://blog.example.com/").unwrap();
/// assert_eq!(classify(&link, &seed), LinkScope::External);
/// ```
pub fn classify(url: &Url, seed: &Url) -> LinkScope {
    if url.origin() == seed.origin() {
        LinkScope::Internal
    } else {
        LinkScope::External
    }
}
