// src/fetcher/retry.rs
// =============================================================================
// One retry policy for all fetch paths.
//
// Previously every fetch variant would grow its own retry loop; this struct
// centralizes the answer to "how many attempts, and how long do we wait
// between them?" so callers only differ in the numbers they pass in.
//
// Backoff schedule: base * 2^attempt, optionally with a little random
// jitter so many retries don't line up against the same server.
// =============================================================================

use rand::Rng;
use std::time::Duration;

// A retry schedule: how many times to retry, and how long to wait
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt. 0 means try exactly once.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each subsequent retry
    pub base_delay: Duration,
    /// Add up to 250ms of random jitter to each delay
    pub jitter: bool,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, jitter: bool) -> Self {
        RetryPolicy {
            max_retries,
            base_delay,
            jitter,
        }
    }

    /// Total attempts this policy allows (initial attempt + retries)
    pub fn total_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// How long to sleep after a failed attempt (0-indexed) before the next one
    //
    // attempt 0 -> base, attempt 1 -> base * 2, attempt 2 -> base * 4, ...
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let backoff = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        if self.jitter {
            let extra = rand::thread_rng().gen_range(0..250);
            backoff + Duration::from_millis(extra)
        } else {
            backoff
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_attempts() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO, false).total_attempts(), 1);
        assert_eq!(RetryPolicy::new(2, Duration::ZERO, false).total_attempts(), 3);
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100), false);
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
    }

    #[test]
    fn test_jitter_stays_bounded() {
        let policy = RetryPolicy::new(1, Duration::from_millis(100), true);
        for _ in 0..20 {
            let delay = policy.delay_for(0);
            assert!(delay >= Duration::from_millis(100));
            assert!(delay < Duration::from_millis(350));
        }
    }
}
