//! Job state definitions
//!
//! A job moves `Pending → Skipped` or `Pending → Running → … → Succeeded | Failed`.
use crate::job::JobError;
use std::fmt;
use std::path::PathBuf;

/// Represents the current state of one URL's job
#[derive(Debug)]
pub enum JobState {
    // ===== Active States =====
    /// Created, idempotency gate not yet checked
    Pending,

    /// About to make attempt number `attempt` (1-based), with the error
    /// that ended the previous one
    Running {
        attempt: u32,
        last_error: Option<JobError>,
    },

    // ===== Terminal States =====
    /// Output already present and large enough
    Skipped,

    /// Output written
    Succeeded { path: PathBuf, attempts: u32 },

    /// Abandoned; nothing written
    Failed { attempts: u32, error: JobError },
}

impl JobState {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Running { .. })
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Returns true if the job did no work because the output exists
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    /// Returns true if this is a final failure
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Short lowercase label used in logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running { .. } => "running",
            Self::Skipped => "skipped",
            Self::Succeeded { .. } => "succeeded",
            Self::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running {
                attempt,
                last_error: Some(error),
            } => write!(f, "running (attempt {}, last error: {})", attempt, error),
            Self::Running { attempt, .. } => write!(f, "running (attempt {})", attempt),
            other => write!(f, "{}", other.label()),
        }
    }
}
