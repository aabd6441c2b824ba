//! Retry policy for document requests
//!
//! Transport failures are retried with exponential backoff:
//!
//! | Attempt | Delay before next attempt          |
//! |---------|------------------------------------|
//! | 1       | `base`                             |
//! | 2       | `base * 2`                         |
//! | n       | `min(base * 2^(n-1), max_delay)`   |
//!
//! After `max_retries` extra attempts the last error is surfaced.

use crate::config::CrawlerConfig;
use std::time::Duration;

/// Bounded retry policy with exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub max_retries: u32,

    /// Delay after the first failed attempt
    pub base_delay: Duration,

    /// Cap on any single delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: max_delay.max(base_delay),
        }
    }

    /// Policy that never retries
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO, Duration::ZERO)
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.retry_delay_ms),
            Duration::from_millis(config.max_retry_delay_ms),
        )
    }

    /// Total number of attempts, including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Returns true if another attempt is allowed after `attempt` failed
    ///
    /// `attempt` is 1-based.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts()
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let factor = 1u32 << exponent;
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(500), Duration::from_secs(30))
    }
}
