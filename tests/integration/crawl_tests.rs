//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end, from seed URL to markdown output.

use depthcrawl::config::{Config, CrawlRequest, OutputMode};
use depthcrawl::crawler::crawl;
use depthcrawl::{CrawlError, PageStatus};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing into `dir`
fn create_test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.crawler.max_concurrent_pages_open = 4;
    config.crawler.request_timeout_secs = 5;
    config.user_agent.crawler_name = "TestBot".to_string();
    config.output.directory = dir.to_string_lossy().to_string();
    config
}

fn html_page(title: &str, body: &str) -> ResponseTemplate {
    let html = format!(
        "<html><head><title>{}</title></head><body>{}</body></html>",
        title, body
    );
    ResponseTemplate::new(200).set_body_raw(html, "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, route: &str, title: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(title, body))
        .mount(server)
        .await;
}

fn request(seed: String, dir: &TempDir, max_depth: u32) -> CrawlRequest {
    CrawlRequest {
        url: seed,
        max_depth,
        include_external: false,
        verbose: false,
        output_file: Some(dir.path().join("result.md")),
    }
}

#[tokio::test]
async fn test_crawl_follows_links_to_max_depth() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "Home",
        r#"<h1>Welcome</h1><a href="/a">A</a><a href="/b">B</a>"#,
    )
    .await;
    mount_page(&server, "/a", "A", r#"<p>Page A</p><a href="/c">C</a>"#).await;
    mount_page(&server, "/b", "B", r#"<p>Page B</p><a href="/">Home</a>"#).await;

    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(html_page("C", "<p>Too deep</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let seed = format!("{}/", server.uri());

    let outcome = crawl(request(seed.clone(), &dir, 1), &config)
        .await
        .expect("crawl should succeed");
    let report = outcome.report;

    assert_eq!(report.pages_crawled, 3);
    assert_eq!(report.pages_errored, 0);
    assert_eq!(report.max_depth_reached, 1);
    assert_eq!(report.pages_by_depth.get(&0), Some(&1));
    assert_eq!(report.pages_by_depth.get(&1), Some(&2));
    assert_eq!(report.page(&seed).map(|p| p.depth), Some(0));
    assert_eq!(report.links_beyond_depth, 1);
}

#[tokio::test]
async fn test_output_file_format() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "Home",
        r#"<h1>Welcome</h1><p>Hello from the seed page.</p><a href="/missing">Missing</a>"#,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let seed = format!("{}/", server.uri());

    let outcome = crawl(request(seed.clone(), &dir, 1), &config).await.unwrap();

    let file_path = outcome.file_path.expect("single-file output has a path");
    assert_eq!(file_path, dir.path().join("result.md"));

    let content = fs::read_to_string(&file_path).unwrap();
    assert!(content.starts_with(&format!("# {}\n\n## Metadata\n- Depth: 0\n- Timestamp: ", seed)));
    assert!(content.contains("## Content\n"));
    assert!(content.contains("Hello from the seed page."));

    // The missing page is recorded with an error section
    assert!(content.contains(&format!("# {}missing\n", seed)));
    assert!(content.contains("## Error\nHTTP 404: Not Found"));
    assert_eq!(content.matches("\n---\n").count(), 2);
}

#[tokio::test]
async fn test_http_errors_are_counted_not_fatal() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "Home",
        r#"<a href="/missing">1</a><a href="/private">2</a><a href="/broken">3</a><a href="/ok">4</a>"#,
    )
    .await;
    mount_page(&server, "/ok", "OK", "<p>fine</p>").await;

    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let seed = format!("{}/", server.uri());

    let report = crawl(request(seed.clone(), &dir, 1), &config)
        .await
        .unwrap()
        .report;

    assert_eq!(report.pages_crawled, 2);
    assert_eq!(report.pages_errored, 3);
    assert_eq!(report.pages_not_found, 1);
    assert_eq!(report.pages_forbidden, 1);
    assert_eq!(
        report.page(&format!("{}broken", seed)).map(|p| p.status),
        Some(PageStatus::Error)
    );
}

#[tokio::test]
async fn test_soft_error_page_detected() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Home", r#"<a href="/gone">Gone</a>"#).await;
    mount_page(&server, "/gone", "Oops", "<h1>404 Not Found</h1>").await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());

    let report = crawl(request(format!("{}/", server.uri()), &dir, 1), &config)
        .await
        .unwrap()
        .report;

    assert_eq!(report.pages_crawled, 1);
    assert_eq!(report.pages_not_found, 1);
}

#[tokio::test]
async fn test_non_html_content_is_a_page_error() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Home", r#"<a href="/doc.pdf">PDF</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/doc.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 16], "application/pdf"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());

    let report = crawl(request(format!("{}/", server.uri()), &dir, 1), &config)
        .await
        .unwrap()
        .report;

    assert_eq!(report.pages_crawled, 1);
    assert_eq!(report.pages_errored, 1);
}

#[tokio::test]
async fn test_external_links_are_not_fetched() {
    let server = MockServer::start().await;
    let external = MockServer::start().await;

    // Same host, different port: a different origin
    mount_page(
        &server,
        "/",
        "Home",
        &format!(r#"<a href="{}/elsewhere">Elsewhere</a>"#, external.uri()),
    )
    .await;
    Mock::given(method("GET"))
        .respond_with(html_page("External", "<p>external</p>"))
        .expect(0)
        .mount(&external)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());

    let report = crawl(request(format!("{}/", server.uri()), &dir, 2), &config)
        .await
        .unwrap()
        .report;

    assert_eq!(report.pages_crawled, 1);
    assert_eq!(report.external_links_skipped, 1);
}

#[tokio::test]
async fn test_external_links_recorded_when_included() {
    let server = MockServer::start().await;
    let external = MockServer::start().await;

    mount_page(
        &server,
        "/",
        "Home",
        &format!(r#"<a href="{}/elsewhere">Elsewhere</a>"#, external.uri()),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/elsewhere"))
        .respond_with(html_page("External", r#"<a href="/further">Further</a>"#))
        .expect(1)
        .mount(&external)
        .await;
    Mock::given(method("GET"))
        .and(path("/further"))
        .respond_with(html_page("Further", "<p>not expanded</p>"))
        .expect(0)
        .mount(&external)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let mut request = request(format!("{}/", server.uri()), &dir, 3);
    request.include_external = true;

    let report = crawl(request, &config).await.unwrap().report;

    assert_eq!(report.pages_crawled, 2);
    let external_page = report
        .page(&format!("{}/elsewhere", external.uri()))
        .expect("external page is recorded");
    assert!(external_page.external);
    assert_eq!(external_page.depth, 1);
}

#[tokio::test]
async fn test_self_linking_page_fetched_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Loop",
            r##"<a href="/">Self</a><a href="/#top">Top</a><a href="./">Dot</a>"##,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());

    let report = crawl(request(format!("{}/", server.uri()), &dir, 5), &config)
        .await
        .unwrap()
        .report;

    assert_eq!(report.pages_crawled, 1);
    assert_eq!(report.pages_errored, 0);
}

#[tokio::test]
async fn test_unresolvable_seed_is_a_page_error() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());

    let outcome = crawl(
        request("http://nonexistent-host.invalid/".to_string(), &dir, 1),
        &config,
    )
    .await
    .expect("a syntactically valid seed always yields a report");

    assert_eq!(outcome.report.pages_crawled, 0);
    assert_eq!(outcome.report.pages_errored, 1);
}

#[tokio::test]
async fn test_empty_seed_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());

    let result = crawl(request(String::new(), &dir, 1), &config).await;

    assert!(matches!(result, Err(CrawlError::InvalidSeed { .. })));
    assert!(!dir.path().join("result.md").exists());
}

#[tokio::test]
async fn test_generated_output_path() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Home", "<p>hi</p>").await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let mut request = request(format!("{}/", server.uri()), &dir, 0);
    request.output_file = None;

    let outcome = crawl(request, &config).await.unwrap();
    let file_path = outcome.file_path.unwrap();

    assert!(file_path.starts_with(dir.path()));
    let name = file_path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("crawl_127_0_0_1_"));
    assert!(name.ends_with(".md"));
    assert!(file_path.exists());
}

#[tokio::test]
async fn test_per_page_output() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Home", r#"<a href="/about">About</a>"#).await;
    mount_page(&server, "/about", "About", "<p>About us</p>").await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path());
    config.output.mode = OutputMode::PerPage;

    let mut request = request(format!("{}/", server.uri()), &dir, 1);
    request.output_file = Some(dir.path().join("pages"));

    let outcome = crawl(request, &config).await.unwrap();
    let out_dir = outcome.file_path.unwrap();

    let mut files: Vec<String> = fs::read_dir(&out_dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    files.sort();

    assert_eq!(files.len(), 3);
    assert!(files[0].starts_with("0000_127_0_0_1_"));
    assert!(files[1].starts_with("0001_127_0_0_1_") && files[1].ends_with("_about.md"));
    assert_eq!(files[2], "summary.md");
}

#[tokio::test]
async fn test_page_budget_reported() {
    let server = MockServer::start().await;
    let links: String = (0..5)
        .map(|i| format!(r#"<a href="/p{}">{}</a>"#, i, i))
        .collect();
    mount_page(&server, "/", "Home", &links).await;
    for i in 0..5 {
        mount_page(&server, &format!("/p{}", i), "P", "<p>leaf</p>").await;
    }

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(dir.path());
    config.crawler.max_pages = 3;

    let outcome = crawl(request(format!("{}/", server.uri()), &dir, 1), &config)
        .await
        .unwrap();

    assert_eq!(outcome.report.pages_attempted(), 3);
    assert!(outcome.report.budget_exceeded);
    assert!(outcome.summary().contains("page budget reached"));
}

#[tokio::test]
async fn test_report_serializes_to_json() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Home", "<p>hi</p>").await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());

    let outcome = crawl(request(format!("{}/", server.uri()), &dir, 0), &config)
        .await
        .unwrap();

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["report"]["pages_crawled"], 1);
    assert_eq!(json["report"]["per_page"][0]["status"], "ok");
}

#[tokio::test]
async fn test_redirect_off_origin_not_followed_when_external_excluded() {
    let server = MockServer::start().await;
    let external = MockServer::start().await;

    mount_page(&server, "/", "Home", r#"<a href="/go">Go</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/go"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", format!("{}/x", external.uri()).as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(html_page("External", "<p>external content</p>"))
        .expect(0)
        .mount(&external)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());
    let seed = format!("{}/", server.uri());

    let outcome = crawl(request(seed.clone(), &dir, 2), &config).await.unwrap();
    let report = outcome.report;

    assert_eq!(report.pages_crawled, 1);
    assert_eq!(report.pages_errored, 1);
    assert_eq!(
        report.page(&format!("{}go", seed)).map(|p| p.status),
        Some(PageStatus::Error)
    );

    let content = fs::read_to_string(outcome.file_path.unwrap()).unwrap();
    assert!(!content.contains("external content"));
    assert!(content.contains("## Error\nRedirect not followed"));
}

#[tokio::test]
async fn test_redirect_target_fetched_once() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        "Home",
        r#"<a href="/old">Old</a><a href="/next">Next</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html_page("New", "<p>moved content</p>"))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/next", "Next", r#"<a href="/new">New</a>"#).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(dir.path());

    let outcome = crawl(request(format!("{}/", server.uri()), &dir, 2), &config)
        .await
        .unwrap();

    assert_eq!(outcome.report.pages_crawled, 3);
    assert_eq!(outcome.report.duplicate_links, 1);

    let content = fs::read_to_string(outcome.file_path.unwrap()).unwrap();
    assert_eq!(content.matches("moved content").count(), 1);
}
