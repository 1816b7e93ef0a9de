//! Output module for run reports
//!
//! Condensed pages themselves live in the output store; this module only
//! records what a run did.

pub mod stats;

pub use stats::{print_summary, FailedJob, RunSummary};
