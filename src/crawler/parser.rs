//! HTML parser for extracting links, title and readable text
//!
//! Links are returned as raw `href` values in document order; resolving,
//! normalizing and classifying them is left to the coordinator so that invalid
//! links can be counted against the page that contained them.

use scraper::{Html, Selector};

/// Wrap width used when converting HTML to text
const TEXT_WIDTH: usize = 100;

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// Raw link targets in document order
    pub links: Vec<String>,

    /// Readable text of the page body
    pub text: String,
}

/// Parses HTML content and extracts links, title and text
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - Empty hrefs and fragment-only hrefs (same page anchors)
///
/// Other schemes (`mailto:`, `javascript:`, ...) are kept so that they are
/// counted as invalid links when normalized.
///
/// # Example
///
/// ```
/// use depthcrawl::crawler::parse_html;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let parsed = parse_html(html);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links, vec!["/page".to_string()]);
/// ```
pub fn parse_html(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        links: extract_links(&document),
        text: extract_text(&document, html),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts link targets from the HTML document, in document order
fn extract_links(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href], link[rel='canonical'][href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty() && !href.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Converts the document body to readable text
fn extract_text(document: &Html, raw: &str) -> String {
    let body = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next().map(|e| e.html()))
        .unwrap_or_else(|| raw.to_string());

    let text = html2text::from_read(body.as_bytes(), TEXT_WIDTH).unwrap_or_else(|_| body.clone());
    normalize_whitespace(&text)
}

/// Trims trailing whitespace on each line and collapses runs of blank lines
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;

    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }

    out.trim().to_string()
}
