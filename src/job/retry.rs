use crate::config::RetryConfig;
use crate::job::JobError;
use std::time::Duration;

/// Retry policy of a job
///
/// After the n-th failed attempt the job waits a uniformly random time
/// between `min_delay` and `base_delay * 2^n`, capped at `max_delay`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy from the `[retry]` configuration section
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_secs(config.base_delay_secs),
            min_delay: Duration::from_secs(config.min_delay_secs),
            max_delay: Duration::from_secs(config.max_delay_secs),
        }
    }

    /// Whether a job that just failed its `attempt`-th try should go again
    pub fn should_retry(&self, attempt: u32, error: &JobError) -> bool {
        attempt < self.max_attempts && error.is_retryable()
    }

    /// Upper bound of the wait after `attempt` failed attempts
    pub fn ceiling(&self, attempt: u32) -> Duration {
        let exponential = self.base_delay.as_secs_f64() * 2f64.powi(attempt.min(32) as i32);
        let capped = exponential.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped.max(self.min_delay.as_secs_f64()))
    }

    /// Randomized wait after `attempt` failed attempts
    pub fn backoff(&self, attempt: u32) -> Duration {
        let low = self.min_delay.as_secs_f64();
        let high = self.ceiling(attempt).as_secs_f64();

        if high <= low {
            return self.min_delay;
        }

        Duration::from_secs_f64(rand::random_range(low..=high))
    }

    /// Clamps a wait into `[min_delay, max_delay]`
    pub fn clamp(&self, wait: Duration) -> Duration {
        wait.max(self.min_delay).min(self.max_delay)
    }
}
