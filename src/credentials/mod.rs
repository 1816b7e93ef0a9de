//! Credential pool for the summarization service
//!
//! This module provides:
//! - `Credential`: one named API key
//! - `CredentialState`: cooldown and revocation tracking for one key
//! - `CredentialRotator`: the shared pool handing out keys to jobs

mod rotator;
mod state;

pub use rotator::CredentialRotator;
pub use state::CredentialState;

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// One named API key
///
/// `Debug` never prints the key itself.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    name: String,
    key: String,
}

impl Credential {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
        }
    }

    /// Identifier of the credential (its environment variable name)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The secret itself
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("name", &self.name)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// No credential in the pool is usable right now
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("All {pool_size} credentials are exhausted{}", retry_hint(.retry_in))]
pub struct PoolExhausted {
    /// Total number of credentials in the pool
    pub pool_size: usize,

    /// Time until the earliest cooldown expires; `None` if none ever will
    pub retry_in: Option<Duration>,
}

fn retry_hint(retry_in: &Option<Duration>) -> String {
    match retry_in {
        Some(wait) => format!(" (next one free in {:.1}s)", wait.as_secs_f64()),
        None => String::new(),
    }
}
