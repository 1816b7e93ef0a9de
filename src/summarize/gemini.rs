//! Gemini `generateContent` client
//!
//! This module maps one summarization call onto the Gemini REST API and
//! classifies every failure into a `SummarizeError`:
//!
//! | Condition | Result |
//! |-----------|--------|
//! | HTTP 429 | RateLimited (with `Retry-After` / `RetryInfo` hint) |
//! | HTTP 401, 403, 400 with `API_KEY_INVALID` | CredentialRejected |
//! | HTTP 408, 5xx | Transient |
//! | Other 4xx | Rejected |
//! | Timeout, connection error | Transient |
//! | Unparseable body, no candidate text | Malformed |

use crate::config::SummarizerConfig;
use crate::credentials::Credential;
use crate::summarize::{SummarizeError, Summarizer};
use async_trait::async_trait;
use reqwest::{header::RETRY_AFTER, Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Summarizer backed by a hosted Gemini model
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    model: String,
    system_prompt: String,
    timeout: Duration,
}

impl GeminiClient {
    /// Creates a client from the `[summarizer]` configuration section
    pub fn new(client: Client, config: &SummarizerConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Full URL of the generateContent call
    pub fn request_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    fn request_body<'a>(&'a self, source_text: &'a str) -> GenerateRequest<'a> {
        GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: &self.system_prompt,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: source_text }],
            }],
        }
    }
}

#[async_trait]
impl Summarizer for GeminiClient {
    async fn summarize(
        &self,
        credential: &Credential,
        source_text: &str,
    ) -> Result<String, SummarizeError> {
        let response = self
            .client
            .post(self.request_url())
            .header("x-goog-api-key", credential.key())
            .timeout(self.timeout)
            .json(&self.request_body(source_text))
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_error_response(response).await);
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| SummarizeError::Malformed(format!("Unreadable response body: {}", e)))?;

        extract_text(body)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    details: Vec<serde_json::Value>,
}

/// Joins the text parts of the first candidate
fn extract_text(body: GenerateResponse) -> Result<String, SummarizeError> {
    if let Some(reason) = body.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(SummarizeError::Malformed(format!(
            "Prompt blocked: {}",
            reason
        )));
    }

    let candidate = body
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| SummarizeError::Malformed("No candidates in response".to_string()))?;

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(SummarizeError::Malformed(format!(
            "Empty candidate text (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }

    Ok(text)
}

fn classify_transport_error(e: reqwest::Error) -> SummarizeError {
    if e.is_timeout() {
        SummarizeError::Transient("Request timeout".to_string())
    } else if e.is_connect() {
        SummarizeError::Transient(format!("Connection failed: {}", e))
    } else {
        SummarizeError::Transient(e.to_string())
    }
}

async fn classify_error_response(response: Response) -> SummarizeError {
    let status = response.status();
    let header_retry = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs);

    let text = response.text().await.unwrap_or_default();
    let api_error = serde_json::from_str::<ErrorEnvelope>(&text)
        .ok()
        .map(|envelope| envelope.error);
    let message = api_error
        .as_ref()
        .map(|e| match &e.status {
            Some(s) => format!("HTTP {} {}: {}", status.as_u16(), s, e.message),
            None => format!("HTTP {}: {}", status.as_u16(), e.message),
        })
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    match status {
        StatusCode::TOO_MANY_REQUESTS => SummarizeError::RateLimited {
            retry_after: header_retry.or_else(|| api_error.as_ref().and_then(retry_delay)),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            SummarizeError::CredentialRejected(message)
        }
        StatusCode::BAD_REQUEST if text.contains("API_KEY_INVALID") => {
            SummarizeError::CredentialRejected(message)
        }
        StatusCode::REQUEST_TIMEOUT => SummarizeError::Transient(message),
        s if s.is_server_error() => SummarizeError::Transient(message),
        _ => SummarizeError::Rejected(message),
    }
}

/// Reads the `retryDelay` of a `google.rpc.RetryInfo` detail, e.g. `"37s"`
fn retry_delay(error: &ApiError) -> Option<Duration> {
    error
        .details
        .iter()
        .filter_map(|detail| detail.get("retryDelay").and_then(|v| v.as_str()))
        .find_map(parse_proto_duration)
}

fn parse_proto_duration(raw: &str) -> Option<Duration> {
    let secs: f64 = raw.strip_suffix('s')?.parse().ok()?;
    if secs.is_finite() && secs >= 0.0 {
        Some(Duration::from_secs_f64(secs))
    } else {
        None
    }
}
