//! Doc-Digest: condensed documentation mirrors
//!
//! This crate pulls rendered documentation pages from a crawl source, condenses
//! each page through a hosted language model and stores one markdown file per
//! URL. The interesting part is the job orchestration: throttled dispatch,
//! credential rotation under rate limits, retry with backoff and idempotent
//! skip-if-done checks against the output directory.

pub mod config;
pub mod credentials;
pub mod dispatch;
pub mod job;
pub mod output;
pub mod source;
pub mod store;
pub mod summarize;
pub mod url;

use thiserror::Error;

/// Main error type for Doc-Digest startup and wiring
///
/// Errors raised by individual jobs never surface here; they are contained at
/// the job boundary and only show up in logs and the run summary.
#[derive(Debug, Error)]
pub enum DigestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Credential pool is empty: no environment variables match '{prefix}*'")]
    NoCredentials { prefix: String },

    #[error("Output store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("Page source error: {0}")]
    Source(#[from] source::SourceError),

    #[error("Summarizer error: {0}")]
    Summarize(#[from] summarize::SummarizeError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid URL pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Doc-Digest operations
pub type Result<T> = std::result::Result<T, DigestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use credentials::{Credential, CredentialRotator, PoolExhausted};
pub use dispatch::Dispatcher;
pub use job::{JobOutcome, JobState, RetryPolicy, RetryingJob};
pub use output::RunSummary;
pub use source::CrawlResult;
pub use store::{derive_filename, OutputStore};
pub use summarize::{SummarizeError, Summarizer};
