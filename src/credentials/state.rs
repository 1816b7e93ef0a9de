use std::time::Duration;
use tokio::time::Instant;

/// Tracks the usability of one credential
///
/// A credential is either available, cooling down after a rate limit until
/// `exhausted_until`, or revoked for the rest of the process.
#[derive(Debug, Clone, Default)]
pub struct CredentialState {
    /// Number of calls handed out with this credential
    pub use_count: u64,

    /// When the credential was last handed out
    pub last_used: Option<Instant>,

    /// Cooldown deadline after a rate limit
    pub exhausted_until: Option<Instant>,

    /// Rejected by the service; never handed out again
    pub revoked: bool,

    /// Number of rate-limit signals received
    pub rate_limit_hits: u32,
}

impl CredentialState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks if the credential can be handed out at `now`
    pub fn is_available(&self, now: Instant) -> bool {
        if self.revoked {
            return false;
        }

        match self.exhausted_until {
            Some(until) => now >= until,
            None => true,
        }
    }

    /// Records that the credential was handed out
    pub fn record_use(&mut self, now: Instant) {
        self.use_count += 1;
        self.last_used = Some(now);
    }

    /// Takes the credential out of rotation for `cooldown`
    ///
    /// A later deadline always wins over an earlier one.
    pub fn mark_rate_limited(&mut self, now: Instant, cooldown: Duration) {
        self.rate_limit_hits += 1;
        let until = now + cooldown;
        self.exhausted_until = Some(match self.exhausted_until {
            Some(existing) if existing > until => existing,
            _ => until,
        });
    }

    /// Takes the credential out of rotation for good
    pub fn revoke(&mut self) {
        self.revoked = true;
    }

    /// Clears an expired cooldown; returns true if one was cleared
    pub fn clear_expired(&mut self, now: Instant) -> bool {
        match self.exhausted_until {
            Some(until) if now >= until => {
                self.exhausted_until = None;
                true
            }
            _ => false,
        }
    }

    /// Time until the credential becomes available again
    ///
    /// Returns `Some(ZERO)` if it is available now and `None` if it never will be.
    pub fn time_until_available(&self, now: Instant) -> Option<Duration> {
        if self.revoked {
            return None;
        }

        match self.exhausted_until {
            Some(until) if until > now => Some(until - now),
            _ => Some(Duration::ZERO),
        }
    }
}
