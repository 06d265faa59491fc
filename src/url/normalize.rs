use crate::UrlError;
use url::Url;

/// List of tracking query parameters to remove during normalization
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
];

/// Normalizes a possibly-relative URL against the URL of the page it was found on
///
/// # Normalization Steps
///
/// 1. Reject empty input
/// 2. Resolve the reference against `base` (absolute references ignore the base)
/// 3. Reject anything that is not HTTP(S) (`mailto:`, `javascript:`, `tel:`, `data:`, ...)
/// 4. Reject URLs without a host
/// 5. Lowercase scheme and host, drop default ports, remove dot segments
/// 6. Remove fragment (everything after #)
/// 7. Remove tracking query parameters and sort the remaining ones by key
/// 8. Remove empty query string (trailing ?)
///
/// The result is a fixed point: normalizing a normalized URL returns it unchanged.
///
/// # Arguments
///
/// * `raw` - The raw href or URL string
/// * `base` - The page URL used to resolve relative references
///
/// # Returns
///
/// * `Ok(Url)` - Normalized absolute URL
/// * `Err(UrlError)` - The link is invalid and must not enter the frontier
///
/// # Examples
///
/// ```
/// use depthcrawl::url::normalize;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/docs/").unwrap();
/// let url = normalize("../About#team", &base).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/About");
/// ```
pub fn normalize(raw: &str, base: &Url) -> Result<Url, UrlError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(UrlError::Empty);
    }

    // The url crate lowercases scheme and host, strips default ports and
    // removes dot segments while parsing
    let mut url = base
        .join(raw)
        .map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::UnsupportedScheme(url.scheme().to_string()));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(UrlError::MissingHost),
    }

    url.set_fragment(None);

    if let Some(query) = url.query() {
        if query.is_empty() {
            url.set_query(None);
        } else {
            normalize_query(&mut url);
        }
    }

    Ok(url)
}

/// Parses and normalizes an absolute URL with no base page
///
/// Used for seed URLs, where a relative reference is an error.
pub fn normalize_absolute(raw: &str) -> Result<Url, UrlError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(UrlError::Empty);
    }

    let parsed = Url::parse(raw).map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;
    normalize(parsed.as_str(), &parsed)
}

/// Drops tracking parameters and sorts the rest by key
///
/// The query is only rewritten when something actually changes so that the
/// original percent-encoding of untouched queries survives.
fn normalize_query(url: &mut Url) {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut kept: Vec<(String, String)> = pairs
        .iter()
        .filter(|(key, _)| !is_tracking_param(key))
        .cloned()
        .collect();

    // Stable sort keeps the relative order of repeated keys
    kept.sort_by(|a, b| a.0.cmp(&b.0));

    if kept == pairs {
        return;
    }

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept.iter());
    }
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
