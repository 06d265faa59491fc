//! Page renderers
//!
//! A renderer turns a URL into rendered page content: the HTML, the links it
//! contains and its readable text. The coordinator only talks to the
//! [`Renderer`] trait; [`HttpRenderer`] is the default implementation built on
//! a plain HTTP client.
//!
//! Renderers make a single attempt per URL. Failures are returned as a
//! [`FetchError`] and never retried.

use crate::config::UserAgentConfig;
use crate::crawler::parser::parse_html;
use crate::state::FetchError;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, Response, StatusCode};
use std::collections::HashSet;
use std::error::Error as _;
use std::time::Duration;
use url::{Origin, Url};

/// Maximum number of redirects followed for one page
const MAX_REDIRECTS: usize = 10;

/// Rendered page result
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// Final URL after any redirects; relative links resolve against it
    pub final_url: Url,
    /// HTTP status code of the final response
    pub status_code: u16,
    /// Page title
    pub title: Option<String>,
    /// Rendered HTML
    pub html: String,
    /// Raw link targets in document order
    pub links: Vec<String>,
    /// Readable text of the page
    pub text: String,
}

/// Fetches and renders a single URL
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Renders the page at `url`, or reports why it could not be rendered
    async fn render(&self, url: &Url) -> Result<RenderedPage, FetchError>;
}

/// Renderer that fetches pages over HTTP(S) without executing scripts
///
/// Redirects are followed by hand, at most [`MAX_REDIRECTS`] hops. When a
/// redirect origin is set, a hop to any other origin is not requested and the
/// page fails with [`FetchError::Redirect`].
pub struct HttpRenderer {
    client: Client,
    detect_soft_errors: bool,
    redirect_origin: Option<Origin>,
}

impl HttpRenderer {
    /// Creates a renderer with a client configured for `user_agent`
    pub fn new(user_agent: &UserAgentConfig, request_timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self::from_client(build_http_client(user_agent, request_timeout)?))
    }

    /// Wraps an existing HTTP client
    ///
    /// The client should not follow redirects itself.
    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            detect_soft_errors: true,
            redirect_origin: None,
        }
    }

    /// Enables or disables detection of error pages served with status 200
    pub fn with_soft_error_detection(mut self, enabled: bool) -> Self {
        self.detect_soft_errors = enabled;
        self
    }

    /// Refuses redirects that leave the origin of `url`
    pub fn with_redirect_origin(mut self, url: &Url) -> Self {
        self.redirect_origin = Some(url.origin());
        self
    }

    /// Resolves the target of a redirect response, or reports why it is not followed
    fn redirect_target(&self, current: &Url, response: &Response) -> Result<Url, FetchError> {
        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                FetchError::Redirect(format!("{} from {} has no Location", response.status(), current))
            })?;

        let next = current
            .join(location)
            .map_err(|e| FetchError::Redirect(format!("invalid Location {:?}: {}", location, e)))?;

        if next.scheme() != "http" && next.scheme() != "https" {
            return Err(FetchError::Redirect(format!(
                "{} redirects to unsupported URL {}",
                current, next
            )));
        }

        if let Some(origin) = &self.redirect_origin {
            if next.origin() != *origin {
                return Err(FetchError::Redirect(format!(
                    "{} redirects outside the crawled origin to {}",
                    current, next
                )));
            }
        }

        Ok(next)
    }

    /// Checks a final response and parses its body
    async fn read_page(&self, final_url: Url, response: Response) -> Result<RenderedPage, FetchError> {
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(status.as_u16()));
        }

        // A missing Content-Type is given the benefit of the doubt
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !content_type.is_empty() && !is_html_content_type(&content_type) {
            return Err(FetchError::ContentType(content_type));
        }

        let html = response
            .text()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;

        let parsed = parse_html(&html);

        if self.detect_soft_errors {
            if let Some(status) = detect_soft_error(&parsed.text) {
                return Err(FetchError::http_status(status));
            }
        }

        Ok(RenderedPage {
            final_url,
            status_code: status.as_u16(),
            title: parsed.title,
            html,
            links: parsed.links,
            text: parsed.text,
        })
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn render(&self, url: &Url) -> Result<RenderedPage, FetchError> {
        let mut current = url.clone();
        let mut hops: HashSet<String> = HashSet::new();
        hops.insert(current.to_string());

        for _ in 0..=MAX_REDIRECTS {
            let response = self
                .client
                .get(current.clone())
                .send()
                .await
                .map_err(classify_request_error)?;

            if !is_followed_redirect(response.status()) {
                return self.read_page(current, response).await;
            }

            let next = self.redirect_target(&current, &response)?;
            tracing::debug!("Redirect {} -> {}", current, next);

            if !hops.insert(next.to_string()) {
                return Err(FetchError::Redirect(format!("redirect loop at {}", next)));
            }
            current = next;
        }

        Err(FetchError::Redirect(format!(
            "more than {} redirects starting at {}",
            MAX_REDIRECTS, url
        )))
    }
}

/// Status codes whose Location is followed
fn is_followed_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```
/// use depthcrawl::config::UserAgentConfig;
/// use depthcrawl::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    request_timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(request_timeout)
        .connect_timeout(request_timeout.min(Duration::from_secs(10)))
        .redirect(Policy::none()) // Redirects are followed by the renderer
        .gzip(true)
        .brotli(true)
        .build()
}

/// Returns true for HTML and XHTML content types
fn is_html_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("text/html") || content_type.contains("application/xhtml+xml")
}

/// Recognizes error pages that were served with a success status
///
/// Returns the HTTP status the page actually represents.
pub fn detect_soft_error(text: &str) -> Option<u16> {
    if text.contains("404 Not Found") {
        Some(404)
    } else if text.contains("403 Forbidden") {
        Some(403)
    } else {
        None
    }
}

/// Maps a reqwest error onto the fetch error taxonomy
fn classify_request_error(error: reqwest::Error) -> FetchError {
    let detail = error_chain(&error);

    if error.is_timeout() {
        FetchError::Timeout(detail)
    } else if is_dns_error(&detail) {
        FetchError::Dns(detail)
    } else if error.is_connect() {
        FetchError::Connect(detail)
    } else if error.is_redirect() {
        FetchError::Redirect(detail)
    } else {
        FetchError::Render(detail)
    }
}

/// Joins an error and all of its sources into one message
fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn is_dns_error(detail: &str) -> bool {
    let detail = detail.to_ascii_lowercase();
    detail.contains("dns error") || detail.contains("failed to lookup address")
}
