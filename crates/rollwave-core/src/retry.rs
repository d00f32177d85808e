//! Conflict-retry policy.
//!
//! Optimistic-concurrency conflicts are expected and transient, so the
//! update worker retries its whole fetch-mutate-write unit under a bounded
//! policy with capped exponential backoff. The policy is a first-class
//! value: tests run with zero backoff, production with the default.

use std::time::Duration;

/// Bounded retry schedule for optimistic-concurrency conflicts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Backoff after the first conflict; doubles per conflict.
    pub base_backoff: Duration,
    /// Ceiling for the doubled backoff.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A policy with no backoff, for deterministic tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Backoff to sleep after the given failed attempt (1-based):
    /// `base * 2^(attempt-1)`, capped at `max_backoff`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let factor = 2u32.saturating_pow(exponent);
        self.base_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}
