use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use depthcrawl::url::extract_host;
///
/// let url = Url::parse("https://EXAMPLE.COM:8080/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Turns the host and port of a URL into a file-name-safe slug
///
/// Dots become underscores, and a non-default port is appended after an
/// underscore. URLs without a host produce `"unknown"`.
pub fn host_slug(url: &Url) -> String {
    let Some(host) = extract_host(url) else {
        return "unknown".to_string();
    };

    let mut slug: String = host
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();

    if let Some(port) = url.port() {
        slug.push_str(&format!("_{}", port));
    }

    slug
}
