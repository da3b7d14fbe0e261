//! Bounded retry policy for transient failures.

use std::time::Duration;

use crate::error::XError;

/// Default number of attempts, counting the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// How many times to try an operation and how long to wait in between.
///
/// The default retries immediately, up to three attempts in total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Whether to double the delay on each retry.
    pub exponential_backoff: bool,
    /// Upper bound on any single delay, in milliseconds.
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    /// Creates an immediate-retry policy with `max_attempts` attempts.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms: 0,
            exponential_backoff: false,
            max_delay_ms: 30_000,
        }
    }

    /// Disables retries.
    pub fn no_retry() -> Self {
        Self::new(1)
    }

    /// Sets the base delay.
    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Enables or disables exponential backoff.
    #[must_use]
    pub fn with_exponential_backoff(mut self, enabled: bool) -> Self {
        self.exponential_backoff = enabled;
        self
    }

    /// Delay before retry number `attempt` (1 for the first retry).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = if self.exponential_backoff {
            self.base_delay_ms
                .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
        } else {
            self.base_delay_ms
        };

        Duration::from_millis(delay.min(self.max_delay_ms))
    }

    /// Network errors and 5xx responses are retried; nothing else is.
    pub fn should_retry(&self, error: &XError) -> bool {
        error.is_transient()
    }

    /// Returns true if another attempt is allowed after `attempts` tries.
    pub fn has_attempts_left(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}
