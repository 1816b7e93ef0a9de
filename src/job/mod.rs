//! Per-URL jobs
//!
//! This module contains everything that happens to one crawl result:
//! - The idempotency gate against the output store
//! - Credential selection and the summarization call
//! - Retry with randomized exponential backoff
//! - Failure isolation: errors end the job, never the run

mod retry;
mod runner;
mod state;

pub use retry::RetryPolicy;
pub use runner::{JobContext, RetryingJob};
pub use state::JobState;

use crate::credentials::PoolExhausted;
use crate::store::StoreError;
use crate::summarize::SummarizeError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that end or interrupt a job attempt
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Crawl result has no content")]
    EmptySource,

    #[error("{0}")]
    PoolExhausted(#[from] PoolExhausted),

    #[error("Summarization failed: {0}")]
    Summarize(#[from] SummarizeError),

    #[error("Write failed: {0}")]
    Write(#[from] StoreError),

    #[error("Job task aborted: {0}")]
    Aborted(String),
}

impl JobError {
    /// Returns true if a later attempt may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::PoolExhausted(_) => true,
            Self::Summarize(e) => e.is_retryable(),
            Self::InvalidUrl { .. } | Self::EmptySource | Self::Write(_) | Self::Aborted(_) => {
                false
            }
        }
    }
}

/// Final result of one job
#[derive(Debug)]
pub enum JobOutcome {
    /// Output already existed
    Skipped,

    /// Output written after `attempts` attempts
    Succeeded { path: PathBuf, attempts: u32 },

    /// Abandoned after `attempts` attempts
    Failed { attempts: u32, error: JobError },
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl TryFrom<JobState> for JobOutcome {
    type Error = JobState;

    /// Converts a terminal state; active states are handed back
    fn try_from(state: JobState) -> Result<Self, Self::Error> {
        match state {
            JobState::Skipped => Ok(Self::Skipped),
            JobState::Succeeded { path, attempts } => Ok(Self::Succeeded { path, attempts }),
            JobState::Failed { attempts, error } => Ok(Self::Failed { attempts, error }),
            active => Err(active),
        }
    }
}
