//! Run statistics
//!
//! This module keeps the counters of one dispatch run and prints them
//! at the end.

use crate::job::{JobError, JobOutcome};
use chrono::{DateTime, Utc};

/// A job that ended without output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedJob {
    pub url: String,
    pub attempts: u32,
    pub error: String,
}

/// Aggregate report of one run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Hash of the configuration the run was started with
    pub config_hash: Option<String>,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Jobs spawned
    pub dispatched: u64,

    /// Jobs that found their output already present
    pub skipped: u64,

    /// Jobs that wrote their output
    pub succeeded: u64,

    /// Jobs abandoned after their last attempt
    pub failed: u64,

    /// Results dropped because their filename was already claimed this run
    pub duplicates: u64,

    /// Attempts made by succeeded jobs beyond their first
    pub retries: u64,

    pub failures: Vec<FailedJob>,
}

impl RunSummary {
    /// Starts an empty summary stamped with the current time
    pub fn start() -> Self {
        Self {
            config_hash: None,
            started_at: Utc::now(),
            finished_at: None,
            dispatched: 0,
            skipped: 0,
            succeeded: 0,
            failed: 0,
            duplicates: 0,
            retries: 0,
            failures: Vec::new(),
        }
    }

    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    pub fn record_dispatch(&mut self) {
        self.dispatched += 1;
    }

    pub fn record_duplicate(&mut self) {
        self.duplicates += 1;
    }

    /// Counts a finished job
    pub fn record(&mut self, url: &str, outcome: &JobOutcome) {
        match outcome {
            JobOutcome::Skipped => self.skipped += 1,
            JobOutcome::Succeeded { attempts, .. } => {
                self.succeeded += 1;
                self.retries += u64::from(attempts.saturating_sub(1));
            }
            JobOutcome::Failed { attempts, error } => self.record_failure(url, *attempts, error),
        }
    }

    pub fn record_failure(&mut self, url: &str, attempts: u32, error: &JobError) {
        self.failed += 1;
        self.failures.push(FailedJob {
            url: url.to_string(),
            attempts,
            error: error.to_string(),
        });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Jobs that reached a terminal state
    pub fn completed(&self) -> u64 {
        self.skipped + self.succeeded + self.failed
    }

    /// Jobs spawned but not yet completed
    pub fn in_flight(&self) -> u64 {
        self.dispatched.saturating_sub(self.completed())
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::start()
    }
}

/// Prints a run summary to stdout in a formatted manner
pub fn print_summary(summary: &RunSummary) {
    println!("=== Run Summary ===\n");

    println!("Overview:");
    println!(
        "  Started: {}",
        summary.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Some(finished) = summary.finished_at {
        println!("  Finished: {}", finished.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(seconds) = summary.duration_seconds() {
        println!("  Duration: {}s", seconds);
    }
    if let Some(hash) = &summary.config_hash {
        println!("  Config hash: {}", &hash[..hash.len().min(12)]);
    }
    println!();

    println!("Jobs:");
    println!("  Dispatched: {}", summary.dispatched);
    for (label, count) in [
        ("Succeeded", summary.succeeded),
        ("Skipped (already done)", summary.skipped),
        ("Failed", summary.failed),
    ] {
        let percentage = if summary.dispatched > 0 {
            (count as f64 / summary.dispatched as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", label, count, percentage);
    }
    println!("  Duplicates dropped: {}", summary.duplicates);
    println!("  Retries: {}", summary.retries);
    println!();

    if !summary.failures.is_empty() {
        println!("Failures ({}):", summary.failures.len());
        for failure in &summary.failures {
            println!(
                "  - {} after {} attempt(s): {}",
                failure.url, failure.attempts, failure.error
            );
        }
        println!();
    }
}
