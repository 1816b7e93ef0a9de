//! Dispatcher, jobs and output store working together

use async_trait::async_trait;
use doc_digest::config::{SourceConfig, SummarizerConfig};
use doc_digest::job::JobContext;
use doc_digest::source::PageSource;
use doc_digest::summarize::GeminiClient;
use doc_digest::{
    Credential, CredentialRotator, CrawlResult, Dispatcher, OutputStore, RetryPolicy, RunSummary,
    SummarizeError, Summarizer,
};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Answers per page and per credential, recording every call
struct FakeSummarizer {
    calls: Mutex<Vec<(String, String)>>,
    failing_pages: Vec<String>,
    rate_limited_keys: Vec<String>,
}

impl FakeSummarizer {
    fn new() -> Arc<Self> {
        Self::with(vec![], vec![])
    }

    fn with(failing_pages: Vec<&str>, rate_limited_keys: Vec<&str>) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            failing_pages: failing_pages.into_iter().map(String::from).collect(),
            rate_limited_keys: rate_limited_keys.into_iter().map(String::from).collect(),
        })
    }

    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    async fn summarize(
        &self,
        credential: &Credential,
        source_text: &str,
    ) -> Result<String, SummarizeError> {
        self.calls
            .lock()
            .unwrap()
            .push((credential.name().to_string(), source_text.to_string()));

        if self.rate_limited_keys.iter().any(|k| k == credential.name()) {
            return Err(SummarizeError::RateLimited {
                retry_after: Some(Duration::from_secs(3600)),
            });
        }
        if self.failing_pages.iter().any(|p| source_text.contains(p.as_str())) {
            return Err(SummarizeError::Rejected("HTTP 400".to_string()));
        }
        Ok("condensed".to_string())
    }
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
        min_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(20),
    }
}

fn rotator(names: &[&str]) -> Arc<CredentialRotator> {
    Arc::new(CredentialRotator::new(
        names
            .iter()
            .map(|n| Credential::new(*n, format!("key-{}", n)))
            .collect(),
        Duration::from_secs(60),
    ))
}

async fn run(
    dir: &TempDir,
    summarizer: Arc<FakeSummarizer>,
    pool: Arc<CredentialRotator>,
    results: Vec<CrawlResult>,
) -> RunSummary {
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        for result in results {
            if tx.send(result).await.is_err() {
                break;
            }
        }
    });

    let ctx = JobContext::new(
        Arc::new(OutputStore::new(dir.path())),
        pool,
        summarizer,
        fast_policy(),
    );

    Dispatcher::new(Duration::from_millis(5), 4)
        .run(rx, ctx, RunSummary::start())
        .await
}

fn page(url: &str, text: &str) -> CrawlResult {
    CrawlResult::new(url, format!("# Page\n\n{}", text))
}

#[tokio::test]
async fn test_single_page_writes_record() {
    let dir = TempDir::new().unwrap();
    let summarizer = FakeSummarizer::new();

    let summary = run(
        &dir,
        summarizer.clone(),
        rotator(&["K1"]),
        vec![page("https://example.com/docs/foo", "foo text")],
    )
    .await;

    assert_eq!(summary.succeeded, 1);
    let content = std::fs::read_to_string(dir.path().join("foo.md")).unwrap();
    assert_eq!(content, "# https://example.com/docs/foo\n\ncondensed");
    assert_eq!(
        summarizer.calls(),
        vec![("K1".to_string(), "# Page\n\nfoo text".to_string())]
    );
}

#[tokio::test]
async fn test_rerun_makes_no_calls() {
    let dir = TempDir::new().unwrap();
    let pages = || {
        (0..5)
            .map(|i| {
                page(
                    &format!("https://example.com/docs/page-{}", i),
                    &"long enough text ".repeat(10),
                )
            })
            .collect::<Vec<_>>()
    };

    // Records are "# {url}\n\ncondensed", which must clear the size threshold
    let store = OutputStore::new(dir.path()).with_min_content_chars(20);
    let first = FakeSummarizer::new();
    let (tx, rx) = mpsc::channel(8);
    for result in pages() {
        tx.send(result).await.unwrap();
    }
    drop(tx);
    let ctx = JobContext::new(
        Arc::new(store),
        rotator(&["K1"]),
        first.clone(),
        fast_policy(),
    );
    let summary = Dispatcher::new(Duration::from_millis(1), 4)
        .run(rx, ctx.clone(), RunSummary::start())
        .await;
    assert_eq!(summary.succeeded, 5);
    assert_eq!(first.calls().len(), 5);

    let second = FakeSummarizer::new();
    let (tx, rx) = mpsc::channel(8);
    for result in pages() {
        tx.send(result).await.unwrap();
    }
    drop(tx);
    let ctx = JobContext {
        summarizer: second.clone(),
        ..ctx
    };
    let summary = Dispatcher::new(Duration::from_millis(1), 4)
        .run(rx, ctx, RunSummary::start())
        .await;

    assert_eq!(summary.skipped, 5);
    assert_eq!(summary.succeeded, 0);
    assert!(second.calls().is_empty());
}

#[tokio::test]
async fn test_failing_page_does_not_affect_others() {
    let dir = TempDir::new().unwrap();
    let summarizer = FakeSummarizer::with(vec!["poison"], vec![]);

    let summary = run(
        &dir,
        summarizer,
        rotator(&["K1"]),
        vec![
            page("https://example.com/docs/a", "poison"),
            page("https://example.com/docs/b", "fine"),
        ],
    )
    .await;

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failures[0].url, "https://example.com/docs/a");
    assert!(!dir.path().join("a.md").exists());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("b.md")).unwrap(),
        "# https://example.com/docs/b\n\ncondensed"
    );
}

#[tokio::test]
async fn test_rate_limited_key_is_rotated_out() {
    let dir = TempDir::new().unwrap();
    let summarizer = FakeSummarizer::with(vec![], vec!["K1"]);
    let pool = rotator(&["K1", "K2"]);

    let summary = run(
        &dir,
        summarizer.clone(),
        pool.clone(),
        vec![
            page("https://example.com/docs/a", "a"),
            page("https://example.com/docs/b", "b"),
            page("https://example.com/docs/c", "c"),
        ],
    )
    .await;

    assert_eq!(summary.succeeded, 3);
    assert!(pool.is_exhausted("K1"));

    let calls = summarizer.calls();
    let k1_calls = calls.iter().filter(|(key, _)| key == "K1").count();
    let k2_calls = calls.iter().filter(|(key, _)| key == "K2").count();
    assert_eq!(k1_calls, 1, "K1 should be used once, then benched");
    assert_eq!(k2_calls, 3);
}

#[tokio::test]
async fn test_distinct_urls_get_distinct_files() {
    let dir = TempDir::new().unwrap();

    let summary = run(
        &dir,
        FakeSummarizer::new(),
        rotator(&["K1"]),
        vec![
            page("https://example.com/docs/guide/install", "x"),
            page("https://example.com/docs/guide-install", "y"),
            page("https://example.com/", "root"),
        ],
    )
    .await;

    assert_eq!(summary.succeeded, 3);
    assert!(dir.path().join("guide_install.md").exists());
    assert!(dir.path().join("guide-install.md").exists());
    assert!(dir.path().join("index.md").exists());
}

#[tokio::test]
async fn test_site_to_files_over_http() {
    let site = MockServer::start().await;
    let api = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/docs/index"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><body><main><h1>Docs</h1><a href="/docs/setup">Setup</a></main></body></html>"#,
            "text/html",
        ))
        .mount(&site)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs/setup"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><body><main><h1>Setup</h1><p>Run the installer.</p></main></body></html>"#,
            "text/html",
        ))
        .mount(&site)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "summary"}]}}]
        })))
        .expect(2)
        .mount(&api)
        .await;

    let dir = TempDir::new().unwrap();
    let client = reqwest::Client::new();
    let source = PageSource::new(
        client.clone(),
        &SourceConfig {
            seeds: vec![format!("{}/docs/index", site.uri())],
            sitemap: None,
            pattern: Some("*/docs/*".to_string()),
            max_depth: 1,
            buffer_size: 2,
        },
    )
    .unwrap();
    let summarizer = GeminiClient::new(
        client,
        &SummarizerConfig {
            endpoint: format!("{}/v1beta", api.uri()),
            ..SummarizerConfig::default()
        },
    );
    let ctx = JobContext::new(
        Arc::new(OutputStore::new(dir.path())),
        rotator(&["K1"]),
        Arc::new(summarizer),
        fast_policy(),
    );

    let summary = Dispatcher::new(Duration::from_millis(5), 2)
        .run(source.start().await.unwrap(), ctx, RunSummary::start())
        .await;

    assert_eq!(summary.succeeded, 2);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("setup.md")).unwrap(),
        format!("# {}/docs/setup\n\nsummary", site.uri())
    );
    assert!(dir.path().join("index.md").exists());
}
