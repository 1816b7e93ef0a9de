//! Page source against a mock documentation site

use doc_digest::config::SourceConfig;
use doc_digest::source::{PageSource, SourceError};
use doc_digest::CrawlResult;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><head><title>Docs</title></head><body>{}</body></html>", body),
        "text/html",
    )
}

async fn mount_page(server: &MockServer, page_path: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html(body))
        .mount(server)
        .await;
}

fn source_config(seeds: Vec<String>) -> SourceConfig {
    SourceConfig {
        seeds,
        sitemap: None,
        pattern: None,
        max_depth: 0,
        buffer_size: 4,
    }
}

async fn collect(config: SourceConfig) -> Vec<CrawlResult> {
    let source = PageSource::new(reqwest::Client::new(), &config).unwrap();
    let mut rx = source.start().await.unwrap();

    let mut results = Vec::new();
    while let Some(result) = rx.recv().await {
        results.push(result);
    }
    results
}

fn urls(results: &[CrawlResult]) -> Vec<String> {
    results.iter().map(|r| r.url.clone()).collect()
}

#[tokio::test]
async fn test_seed_is_rendered() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/docs/intro",
        "<main><h1>Intro</h1><p>Welcome to the docs.</p><pre>cargo add foo</pre></main>",
    )
    .await;

    let results = collect(source_config(vec![format!("{}/docs/intro", server.uri())])).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].url, format!("{}/docs/intro", server.uri()));
    let markdown = &results[0].markdown;
    assert!(markdown.contains("Intro"));
    assert!(markdown.contains("Welcome to the docs."));
    assert!(markdown.contains("cargo add foo"));
    assert!(!markdown.contains("<main>"));
}

#[tokio::test]
async fn test_depth_zero_does_not_follow_links() {
    let server = MockServer::start().await;
    mount_page(&server, "/docs/a", r#"<p>A</p><a href="/docs/b">B</a>"#).await;
    mount_page(&server, "/docs/b", "<p>B</p>").await;

    let results = collect(source_config(vec![format!("{}/docs/a", server.uri())])).await;

    assert_eq!(urls(&results), vec![format!("{}/docs/a", server.uri())]);
}

#[tokio::test]
async fn test_breadth_first_follows_in_scope_links() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/docs/index",
        r##"<p>Index</p>
            <a href="/docs/a">A</a>
            <a href="/docs/b#section">B</a>
            <a href="/blog/post">Blog</a>
            <a href="https://elsewhere.example/docs/x">External</a>"##,
    )
    .await;
    mount_page(
        &server,
        "/docs/a",
        r#"<p>A</p><a href="/docs/index">Back</a><a href="/docs/deep">Deep</a>"#,
    )
    .await;
    mount_page(&server, "/docs/b", "<p>B</p>").await;
    mount_page(&server, "/docs/deep", "<p>Deep</p>").await;
    mount_page(&server, "/blog/post", "<p>Blog</p>").await;

    let mut config = source_config(vec![format!("{}/docs/index", server.uri())]);
    config.pattern = Some("*/docs/*".to_string());
    config.max_depth = 1;

    let results = collect(config).await;

    assert_eq!(
        urls(&results),
        vec![
            format!("{}/docs/index", server.uri()),
            format!("{}/docs/a", server.uri()),
            format!("{}/docs/b", server.uri()),
        ]
    );
}

#[tokio::test]
async fn test_sitemap_entries_are_added() {
    let server = MockServer::start().await;
    let sitemap = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>{uri}/docs/a</loc></url>
  <url><loc>{uri}/docs/b</loc></url>
  <url><loc>{uri}/about</loc></url>
</urlset>"#,
        uri = server.uri()
    );
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sitemap, "application/xml"))
        .mount(&server)
        .await;
    mount_page(&server, "/docs/a", "<p>A</p>").await;
    mount_page(&server, "/docs/b", "<p>B</p>").await;
    mount_page(&server, "/about", "<p>About</p>").await;

    let mut config = source_config(vec![]);
    config.sitemap = Some(format!("{}/sitemap.xml", server.uri()));
    config.pattern = Some("*/docs/*".to_string());

    let results = collect(config).await;

    assert_eq!(
        urls(&results),
        vec![
            format!("{}/docs/a", server.uri()),
            format!("{}/docs/b", server.uri()),
        ]
    );
}

#[tokio::test]
async fn test_missing_sitemap_falls_back_to_seeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_page(&server, "/docs/a", "<p>A</p>").await;

    let mut config = source_config(vec![format!("{}/docs/a", server.uri())]);
    config.sitemap = Some(format!("{}/sitemap.xml", server.uri()));

    let results = collect(config).await;
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn test_missing_sitemap_without_seeds_fails_to_start() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let mut config = source_config(vec![]);
    config.sitemap = Some(format!("{}/sitemap.xml", server.uri()));
    let source = PageSource::new(reqwest::Client::new(), &config).unwrap();

    let err = source.start().await.unwrap_err();
    assert!(matches!(err, SourceError::Sitemap { .. }));
    assert!(err.to_string().contains("HTTP 404"));
}

#[tokio::test]
async fn test_sitemap_without_in_scope_entries_fails_to_start() {
    let server = MockServer::start().await;
    let sitemap = format!(
        r#"<urlset><url><loc>{uri}/blog/post</loc></url></urlset>"#,
        uri = server.uri()
    );
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sitemap, "application/xml"))
        .mount(&server)
        .await;

    let mut config = source_config(vec![]);
    config.sitemap = Some(format!("{}/sitemap.xml", server.uri()));
    config.pattern = Some("*/docs/*".to_string());
    let source = PageSource::new(reqwest::Client::new(), &config).unwrap();

    assert!(matches!(
        source.start().await,
        Err(SourceError::Sitemap { .. })
    ));
}

#[tokio::test]
async fn test_failed_pages_are_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/docs/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs/data.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&server)
        .await;
    mount_page(&server, "/docs/empty", "<script>app()</script>").await;
    mount_page(&server, "/docs/ok", "<p>Fine</p>").await;

    let results = collect(source_config(vec![
        format!("{}/docs/missing", server.uri()),
        format!("{}/docs/data.json", server.uri()),
        format!("{}/docs/empty", server.uri()),
        format!("{}/docs/ok", server.uri()),
    ]))
    .await;

    assert_eq!(urls(&results), vec![format!("{}/docs/ok", server.uri())]);
}

#[tokio::test]
async fn test_dropped_receiver_stops_source() {
    let server = MockServer::start().await;
    mount_page(&server, "/docs/a", "<p>A</p>").await;

    let config = source_config(vec![format!("{}/docs/a", server.uri())]);
    let source = PageSource::new(reqwest::Client::new(), &config).unwrap();
    let rx = source.start().await.unwrap();
    drop(rx);

    // Nothing to assert beyond the producer task not panicking
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
}
