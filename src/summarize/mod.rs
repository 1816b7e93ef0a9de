//! Summarization boundary
//!
//! The core only depends on the `Summarizer` trait: one call that turns page
//! markdown into condensed markdown using a given credential, and a small
//! error taxonomy the retry loop can act on.

mod gemini;

pub use gemini::GeminiClient;

use crate::credentials::Credential;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Condenses page text through an external service
///
/// Implementations must not touch local state: the same call may be repeated
/// by the retry loop with a different credential.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        credential: &Credential,
        source_text: &str,
    ) -> Result<String, SummarizeError>;
}

/// Ways a summarization call can fail
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SummarizeError {
    /// Network error, timeout or server-side failure
    #[error("Transient failure: {0}")]
    Transient(String),

    /// Rate limit or quota hit for the credential used
    #[error("Rate limited{}", retry_after_hint(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    /// The service answered but with nothing usable
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The credential itself was refused (invalid or disabled key)
    #[error("Credential rejected: {0}")]
    CredentialRejected(String),

    /// The request can never succeed as sent
    #[error("Request rejected: {0}")]
    Rejected(String),
}

impl SummarizeError {
    /// Returns true if the same input may succeed on a later attempt
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}

fn retry_after_hint(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(wait) => format!(" (retry after {}s)", wait.as_secs()),
        None => String::new(),
    }
}
