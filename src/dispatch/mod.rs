//! Job dispatch
//!
//! This module consumes the stream of crawl results and turns each one into
//! a concurrently running job:
//! - One job per result, spawned in arrival order
//! - A fixed pause between spawns so the summarization service is not flooded
//! - A semaphore bounding how many jobs run at once
//! - Duplicate results (same output filename) dropped within a run
//!
//! Spawning never waits for a job to finish; the only pause the producer
//! sees is the throttle.

use crate::config::DispatcherConfig;
use crate::job::{JobContext, JobError, JobOutcome, RetryingJob};
use crate::output::RunSummary;
use crate::source::CrawlResult;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{Id, JoinError, JoinSet};

/// Spawns throttled, bounded jobs for a stream of crawl results
#[derive(Debug, Clone)]
pub struct Dispatcher {
    throttle: Duration,
    max_concurrent: usize,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(Duration::from_millis(200), 8)
    }
}

impl Dispatcher {
    pub fn new(throttle: Duration, max_concurrent: usize) -> Self {
        Self {
            throttle,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Creates a dispatcher from the `[dispatcher]` configuration section
    pub fn from_config(config: &DispatcherConfig) -> Self {
        Self::new(
            Duration::from_millis(config.throttle_ms),
            config.max_concurrent_jobs as usize,
        )
    }

    pub fn throttle(&self) -> Duration {
        self.throttle
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Runs until the stream ends and every spawned job has finished
    ///
    /// Job failures, including panics, are counted in the summary and never
    /// stop the run.
    pub async fn run(
        &self,
        mut results: mpsc::Receiver<CrawlResult>,
        ctx: JobContext,
        summary: RunSummary,
    ) -> RunSummary {
        let mut run = DispatchRun::new(summary, self.max_concurrent);

        while let Some(result) = results.recv().await {
            tracing::info!("Processing {} | MD size: {}", result.url, result.size());

            run.dispatch(result, &ctx);
            run.reap_finished();

            tokio::time::sleep(self.throttle).await;
        }

        tracing::debug!(
            "Result stream ended, waiting for {} running job(s)",
            run.jobs.len()
        );
        run.drain().await;

        let mut summary = run.summary;
        summary.finish();
        tracing::info!(
            "Run finished: {} succeeded, {} skipped, {} failed",
            summary.succeeded,
            summary.skipped,
            summary.failed
        );
        summary
    }
}

/// Bookkeeping of one `Dispatcher::run`
struct DispatchRun {
    summary: RunSummary,
    jobs: JoinSet<JobOutcome>,
    urls: HashMap<Id, String>,
    /// Output filename -> URL of the job that claimed it
    claimed: HashMap<String, String>,
    permits: Arc<Semaphore>,
}

impl DispatchRun {
    fn new(summary: RunSummary, max_concurrent: usize) -> Self {
        Self {
            summary,
            jobs: JoinSet::new(),
            urls: HashMap::new(),
            claimed: HashMap::new(),
            permits: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    /// Claims `filename` for `url`, or returns the URL already holding it
    fn claim(&mut self, filename: String, url: &str) -> Result<(), String> {
        match self.claimed.get(&filename) {
            Some(holder) => Err(holder.clone()),
            None => {
                self.claimed.insert(filename, url.to_string());
                Ok(())
            }
        }
    }

    fn dispatch(&mut self, result: CrawlResult, ctx: &JobContext) {
        let filename = ctx.store.filename_for(&result.url);
        if let Err(holder) = self.claim(filename.clone(), &result.url) {
            tracing::warn!(
                "Dropping {}: {} is already claimed by {} in this run",
                result.url,
                filename,
                holder
            );
            self.summary.record_duplicate();
            return;
        }

        let url = result.url.clone();
        let job = RetryingJob::new(result, ctx.clone());
        let permits = self.permits.clone();

        let handle = self.jobs.spawn(async move {
            // The semaphore is never closed, so the permit is always granted
            let _permit = permits.acquire_owned().await.ok();
            job.run().await
        });

        self.urls.insert(handle.id(), url);
        self.summary.record_dispatch();
    }

    fn reap_finished(&mut self) {
        while let Some(joined) = self.jobs.try_join_next_with_id() {
            self.record(joined);
        }
    }

    async fn drain(&mut self) {
        while let Some(joined) = self.jobs.join_next_with_id().await {
            self.record(joined);
        }
    }

    fn record(&mut self, joined: Result<(Id, JobOutcome), JoinError>) {
        match joined {
            Ok((id, outcome)) => {
                let url = self.urls.remove(&id).unwrap_or_default();
                self.summary.record(&url, &outcome);
            }
            Err(e) => {
                let url = self.urls.remove(&e.id()).unwrap_or_default();
                tracing::error!("Job for {} aborted: {}", url, e);
                self.summary
                    .record_failure(&url, 0, &JobError::Aborted(e.to_string()));
            }
        }
    }
}
