//! Shared credential pool with least-recently-used rotation

use crate::credentials::state::CredentialState;
use crate::credentials::{Credential, PoolExhausted};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

struct PoolEntry {
    credential: Credential,
    state: CredentialState,
}

/// Hands out API credentials to concurrent jobs
///
/// The rotator is shared behind an `Arc`. Its state lives behind a mutex that
/// is never held across an `.await`, so marking a credential exhausted is
/// atomic with respect to every concurrent `next()`.
pub struct CredentialRotator {
    entries: Mutex<Vec<PoolEntry>>,
    default_cooldown: Duration,
}

impl CredentialRotator {
    /// Creates a rotator over the given credentials
    pub fn new(credentials: Vec<Credential>, default_cooldown: Duration) -> Self {
        let entries = credentials
            .into_iter()
            .map(|credential| PoolEntry {
                credential,
                state: CredentialState::new(),
            })
            .collect();

        Self {
            entries: Mutex::new(entries),
            default_cooldown,
        }
    }

    /// Builds the pool from the process environment
    ///
    /// Every variable whose name starts with `prefix` and whose value is not
    /// blank becomes a credential, in name order.
    pub fn from_env(prefix: &str, default_cooldown: Duration) -> Self {
        Self::from_vars(std::env::vars(), prefix, default_cooldown)
    }

    /// Builds the pool from `(name, value)` pairs
    pub fn from_vars<I>(vars: I, prefix: &str, default_cooldown: Duration) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut credentials: Vec<Credential> = vars
            .into_iter()
            .filter(|(name, value)| name.starts_with(prefix) && !value.trim().is_empty())
            .map(|(name, value)| Credential::new(name, value.trim()))
            .collect();
        credentials.sort_by(|a, b| a.name().cmp(b.name()));
        credentials.dedup_by(|a, b| a.name() == b.name());

        Self::new(credentials, default_cooldown)
    }

    /// Total number of credentials, usable or not
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of credentials usable right now
    pub fn available(&self) -> usize {
        let now = Instant::now();
        self.lock()
            .iter()
            .filter(|entry| entry.state.is_available(now))
            .count()
    }

    /// Names of all credentials in pool order
    pub fn names(&self) -> Vec<String> {
        self.lock()
            .iter()
            .map(|entry| entry.credential.name().to_string())
            .collect()
    }

    /// Returns true if the named credential is currently excluded
    pub fn is_exhausted(&self, name: &str) -> bool {
        let now = Instant::now();
        self.lock()
            .iter()
            .find(|entry| entry.credential.name() == name)
            .map_or(false, |entry| !entry.state.is_available(now))
    }

    /// Picks the least recently used credential that is not exhausted
    ///
    /// Ties (e.g. never-used credentials) go to pool order, which makes the
    /// rotation round-robin in steady state.
    pub fn next(&self) -> Result<Credential, PoolExhausted> {
        let now = Instant::now();
        let mut entries = self.lock();

        for entry in entries.iter_mut() {
            if entry.state.clear_expired(now) {
                tracing::info!("Credential {} is back in rotation", entry.credential.name());
            }
        }

        let chosen = entries
            .iter_mut()
            .filter(|entry| entry.state.is_available(now))
            .min_by_key(|entry| entry.state.last_used);

        match chosen {
            Some(entry) => {
                entry.state.record_use(now);
                Ok(entry.credential.clone())
            }
            None => {
                let retry_in = entries
                    .iter()
                    .filter_map(|entry| entry.state.time_until_available(now))
                    .min();
                Err(PoolExhausted {
                    pool_size: entries.len(),
                    retry_in,
                })
            }
        }
    }

    /// Takes a credential out of rotation after a rate-limit signal
    ///
    /// Uses `retry_after` when the service supplied one, otherwise the
    /// rotator's default cooldown.
    pub fn mark_rate_limited(&self, name: &str, retry_after: Option<Duration>) {
        let now = Instant::now();
        let cooldown = retry_after.unwrap_or(self.default_cooldown);
        let mut entries = self.lock();

        if let Some(entry) = entries.iter_mut().find(|e| e.credential.name() == name) {
            entry.state.mark_rate_limited(now, cooldown);
            tracing::warn!(
                "Credential {} rate limited, cooling down for {:?}",
                name,
                cooldown
            );
        }
    }

    /// Excludes a credential for `cooldown`, or for good when none is known
    pub fn mark_exhausted(&self, name: &str, cooldown: Option<Duration>) {
        match cooldown {
            Some(cooldown) => self.mark_rate_limited(name, Some(cooldown)),
            None => self.revoke(name),
        }
    }

    /// Takes a credential out of rotation for the rest of the process
    pub fn revoke(&self, name: &str) {
        let mut entries = self.lock();

        if let Some(entry) = entries.iter_mut().find(|e| e.credential.name() == name) {
            entry.state.revoke();
            tracing::warn!("Credential {} rejected by the service, revoked", name);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PoolEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for CredentialRotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRotator")
            .field("credentials", &self.names())
            .field("default_cooldown", &self.default_cooldown)
            .finish()
    }
}
