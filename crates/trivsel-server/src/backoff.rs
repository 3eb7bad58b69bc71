//! Retry budget and exponential backoff for upstream calls.
//!
//! Delays are deterministic (`base * 2^(attempt-1)`) so callers and tests can
//! reason about worst-case latency of a single logical fetch.

use std::time::Duration;

const MAX_SHIFT: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Hard limit for a single attempt.
    pub timeout: Duration,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            timeout: Duration::from_secs(8),
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Total attempts including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay to wait before attempt index `attempt` (0-based).
    ///
    /// The first attempt is never delayed.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32 << (attempt - 1).min(MAX_SHIFT);
        self.base_delay.saturating_mul(factor)
    }

    /// Worst-case wall time for one logical fetch.
    pub fn worst_case(&self) -> Duration {
        (0..self.max_attempts()).fold(Duration::ZERO, |acc, attempt| {
            acc.saturating_add(self.delay_before(attempt))
                .saturating_add(self.timeout)
        })
    }
}
