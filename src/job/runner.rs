//! The retrying job: one crawl result driven through a small state machine

use crate::credentials::CredentialRotator;
use crate::job::{JobError, JobOutcome, JobState, RetryPolicy};
use crate::source::CrawlResult;
use crate::store::OutputStore;
use crate::summarize::{SummarizeError, Summarizer};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Shared collaborators handed to every job
#[derive(Clone)]
pub struct JobContext {
    pub store: Arc<OutputStore>,
    pub rotator: Arc<CredentialRotator>,
    pub summarizer: Arc<dyn Summarizer>,
    pub policy: RetryPolicy,
}

impl JobContext {
    pub fn new(
        store: Arc<OutputStore>,
        rotator: Arc<CredentialRotator>,
        summarizer: Arc<dyn Summarizer>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            store,
            rotator,
            summarizer,
            policy,
        }
    }
}

/// Processes one crawl result to completion
///
/// A job never returns an error: every failure ends in a terminal
/// `JobState` and is reported through the `JobOutcome`.
pub struct RetryingJob {
    result: CrawlResult,
    ctx: JobContext,
}

impl RetryingJob {
    pub fn new(result: CrawlResult, ctx: JobContext) -> Self {
        Self { result, ctx }
    }

    pub fn url(&self) -> &str {
        &self.result.url
    }

    /// Steps the state machine until it reaches a terminal state
    pub async fn run(self) -> JobOutcome {
        let mut state = JobState::Pending;

        while !state.is_terminal() {
            state = self.step(state).await;
        }

        match JobOutcome::try_from(state) {
            Ok(outcome) => outcome,
            Err(active) => JobOutcome::Failed {
                attempts: 0,
                error: JobError::Aborted(format!("stopped in state {}", active)),
            },
        }
    }

    /// Performs one transition
    pub async fn step(&self, state: JobState) -> JobState {
        match state {
            JobState::Pending => self.admit().await,
            JobState::Running {
                attempt,
                last_error,
            } => self.attempt(attempt, last_error).await,
            terminal => terminal,
        }
    }

    /// Input checks and the idempotency gate, run once before the first attempt
    async fn admit(&self) -> JobState {
        if let Err(error) = validate_url(&self.result.url) {
            tracing::error!("Dropping {}: {}", self.result.url, error);
            return JobState::Failed { attempts: 0, error };
        }

        if self.result.markdown.trim().is_empty() {
            tracing::error!("Dropping {}: crawl result is empty", self.result.url);
            return JobState::Failed {
                attempts: 0,
                error: JobError::EmptySource,
            };
        }

        if self.ctx.store.exists_and_sufficient(&self.result.url).await {
            tracing::info!(
                "Skipping {}: {} already exists",
                self.result.url,
                self.ctx.store.filename_for(&self.result.url)
            );
            return JobState::Skipped;
        }

        JobState::Running {
            attempt: 1,
            last_error: None,
        }
    }

    async fn attempt(&self, attempt: u32, last_error: Option<JobError>) -> JobState {
        let error = match self.try_once().await {
            Ok(path) => {
                match last_error {
                    Some(previous) => tracing::info!(
                        "Wrote {} for {} (attempt {}, recovered from: {})",
                        path.display(),
                        self.result.url,
                        attempt,
                        previous
                    ),
                    None => tracing::info!(
                        "Wrote {} for {} (attempt {})",
                        path.display(),
                        self.result.url,
                        attempt
                    ),
                }
                return JobState::Succeeded {
                    path,
                    attempts: attempt,
                };
            }
            Err(e) => e,
        };

        if !self.ctx.policy.should_retry(attempt, &error) {
            tracing::error!(
                "Giving up on {} after {} attempt(s): {}",
                self.result.url,
                attempt,
                error
            );
            return JobState::Failed {
                attempts: attempt,
                error,
            };
        }

        let wait = self.wait_after(attempt, &error);
        tracing::warn!(
            "Attempt {}/{} for {} failed: {}; retrying in {:.1}s",
            attempt,
            self.ctx.policy.max_attempts,
            self.result.url,
            error,
            wait.as_secs_f64()
        );
        tokio::time::sleep(wait).await;

        JobState::Running {
            attempt: attempt + 1,
            last_error: Some(error),
        }
    }

    /// Acquire a credential, summarize, write
    async fn try_once(&self) -> Result<PathBuf, JobError> {
        let credential = self.ctx.rotator.next()?;

        let summary = match self
            .ctx
            .summarizer
            .summarize(&credential, &self.result.markdown)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                match &e {
                    SummarizeError::RateLimited { retry_after } => {
                        self.ctx
                            .rotator
                            .mark_rate_limited(credential.name(), *retry_after);
                    }
                    SummarizeError::CredentialRejected(_) => {
                        self.ctx.rotator.revoke(credential.name());
                    }
                    _ => {}
                }
                return Err(e.into());
            }
        };

        let path = self
            .ctx
            .store
            .write(&self.result.url, &self.result.url, &summary)
            .await?;

        Ok(path)
    }

    /// Backoff before the next attempt
    ///
    /// When the whole pool is cooling down, waits at least until the first
    /// credential frees up, still within the policy bounds.
    fn wait_after(&self, attempt: u32, error: &JobError) -> Duration {
        let backoff = self.ctx.policy.backoff(attempt);

        match error {
            JobError::PoolExhausted(exhausted) => match exhausted.retry_in {
                Some(retry_in) => self.ctx.policy.clamp(backoff.max(retry_in)),
                None => backoff,
            },
            _ => backoff,
        }
    }
}

fn validate_url(raw: &str) -> Result<(), JobError> {
    let invalid = |reason: String| JobError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme '{}'", other))),
    }
}
