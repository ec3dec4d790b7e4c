//! Retry policy for search result pages
//!
//! The policy answers three questions for the caller's loop: how many attempts
//! are allowed, how long to back off before the next one, and whether a given
//! failure is worth retrying at all. Identity rotation between attempts is left
//! to the caller.

use std::time::Duration;

/// Failures that know whether another attempt could succeed
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Bounded retry policy with linear backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    /// Wait after attempt `n` is `base * n`
    base: Duration,
}

impl RetryPolicy {
    /// Policy with linear backoff; at least one attempt is always made
    pub fn linear(max_attempts: u32, base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns true if `attempt` (1-based) is the last one allowed
    pub fn is_final(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }

    /// Wait before the attempt following `attempt`
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base.saturating_mul(attempt)
    }

    /// Returns true if the caller should try again after `error`
    pub fn should_retry<E: Retryable>(&self, error: &E, attempt: u32) -> bool {
        error.is_retryable() && !self.is_final(attempt)
    }
}
