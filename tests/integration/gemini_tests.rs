//! Gemini client against a mock API

use doc_digest::config::SummarizerConfig;
use doc_digest::summarize::GeminiClient;
use doc_digest::{Credential, SummarizeError, Summarizer};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-2.5-flash:generateContent";

fn client_for(server: &MockServer) -> GeminiClient {
    let config = SummarizerConfig {
        endpoint: format!("{}/v1beta", server.uri()),
        timeout_secs: 5,
        ..SummarizerConfig::default()
    };
    GeminiClient::new(reqwest::Client::new(), &config)
}

fn credential() -> Credential {
    Credential::new("GEMINI_API_KEY_1", "key-1")
}

async fn summarize_with(server: &MockServer) -> Result<String, SummarizeError> {
    client_for(server)
        .summarize(&credential(), "# Page\n\nSome text")
        .await
}

#[tokio::test]
async fn test_successful_summary() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "key-1"))
        .and(body_partial_json(json!({
            "contents": [{"role": "user", "parts": [{"text": "# Page\n\nSome text"}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {"parts": [{"text": "condensed"}], "role": "model"},
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(summarize_with(&server).await.unwrap(), "condensed");
}

#[tokio::test]
async fn test_rate_limit_with_retry_after_header() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&server)
        .await;

    assert_eq!(
        summarize_with(&server).await.unwrap_err(),
        SummarizeError::RateLimited {
            retry_after: Some(Duration::from_secs(7))
        }
    );
}

#[tokio::test]
async fn test_rate_limit_with_retry_info() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {
                "code": 429,
                "message": "Resource has been exhausted",
                "status": "RESOURCE_EXHAUSTED",
                "details": [{
                    "@type": "type.googleapis.com/google.rpc.RetryInfo",
                    "retryDelay": "37s"
                }]
            }
        })))
        .mount(&server)
        .await;

    assert_eq!(
        summarize_with(&server).await.unwrap_err(),
        SummarizeError::RateLimited {
            retry_after: Some(Duration::from_secs(37))
        }
    );
}

#[tokio::test]
async fn test_forbidden_rejects_credential() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "message": "Permission denied", "status": "PERMISSION_DENIED"}
        })))
        .mount(&server)
        .await;

    let err = summarize_with(&server).await.unwrap_err();
    assert!(matches!(err, SummarizeError::CredentialRejected(_)));
    assert!(err.to_string().contains("PERMISSION_DENIED"));
}

#[tokio::test]
async fn test_invalid_key_rejects_credential() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT",
                "details": [{"@type": "type.googleapis.com/google.rpc.ErrorInfo", "reason": "API_KEY_INVALID"}]
            }
        })))
        .mount(&server)
        .await;

    assert!(matches!(
        summarize_with(&server).await,
        Err(SummarizeError::CredentialRejected(_))
    ));
}

#[tokio::test]
async fn test_bad_request_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "Request payload too large", "status": "INVALID_ARGUMENT"}
        })))
        .mount(&server)
        .await;

    let err = summarize_with(&server).await.unwrap_err();
    assert!(matches!(err, SummarizeError::Rejected(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    assert_eq!(
        summarize_with(&server).await.unwrap_err(),
        SummarizeError::Transient("HTTP 503".to_string())
    );
}

#[tokio::test]
async fn test_slow_response_is_transient() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let config = SummarizerConfig {
        endpoint: format!("{}/v1beta", server.uri()),
        timeout_secs: 1,
        ..SummarizerConfig::default()
    };
    let client = GeminiClient::new(reqwest::Client::new(), &config);

    assert_eq!(
        client.summarize(&credential(), "text").await.unwrap_err(),
        SummarizeError::Transient("Request timeout".to_string())
    );
}

#[tokio::test]
async fn test_empty_candidates_are_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
        .mount(&server)
        .await;

    assert!(matches!(
        summarize_with(&server).await,
        Err(SummarizeError::Malformed(_))
    ));
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy page</html>"))
        .mount(&server)
        .await;

    assert!(matches!(
        summarize_with(&server).await,
        Err(SummarizeError::Malformed(_))
    ));
}
