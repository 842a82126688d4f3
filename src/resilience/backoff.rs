//! Delay schedule for a run of consecutive failures.
//!
//! The delay doubles per failure from `base_ms`, is capped at `max_ms`, and
//! carries up to 10% random jitter so that restarted loops do not line up.

use std::time::Duration;

use rand::Rng;

/// Backoff state for a run of consecutive failures.
#[derive(Debug, Clone)]
pub struct Backoff {
    base_ms: u64,
    max_ms: u64,
    failures: u32,
}

impl Backoff {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self {
            base_ms,
            max_ms,
            failures: 0,
        }
    }

    /// Record a failure and return how long to wait before trying again.
    pub fn next_delay(&mut self) -> Duration {
        self.failures = self.failures.saturating_add(1);

        let doublings = self.failures - 1;
        let delay_ms = 1u64
            .checked_shl(doublings)
            .and_then(|factor| self.base_ms.checked_mul(factor))
            .map_or(self.max_ms, |ms| ms.min(self.max_ms));

        let jitter_ms = match delay_ms / 10 {
            0 => 0,
            spread => rand::thread_rng().gen_range(0..spread),
        };
        Duration::from_millis(delay_ms + jitter_ms)
    }

    /// Forget the failure run after a success.
    pub fn reset(&mut self) {
        self.failures = 0;
    }

    /// Consecutive failures recorded since the last reset.
    pub fn failures(&self) -> u32 {
        self.failures
    }
}
