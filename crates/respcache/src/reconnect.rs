//! # Reconnection Policy
//!
//! Bounded backoff for the backing-store connection. The cache is an
//! optimization, not a dependency the service can block on indefinitely, so
//! retrying gives up after a fixed attempt and time budget and the
//! connection becomes permanently failed.

use std::cmp;
use std::time::Duration;

use tokio::time::Instant;

/// Observable connection lifecycle state.
///
/// Owned by the store; callers can read it but never mutate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Initial connection attempt in progress
    Connecting,
    /// Connection established, operations flow through
    Connected,
    /// Connection lost, background task retrying with backoff
    Retrying { attempt: u32 },
    /// Retry budget exhausted. Terminal: a new client must be
    /// constructed to recover.
    Failed,
}

/// Backoff parameters for reconnection attempts
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Delay multiplier: attempt `n` waits `n * base_delay`
    pub base_delay: Duration,

    /// Ceiling on a single backoff delay
    pub max_delay: Duration,

    /// Give up after this many attempts
    pub max_attempts: u32,

    /// Give up once cumulative retry time exceeds this
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(3),
            max_attempts: 10,
            max_elapsed: Duration::from_secs(3600),
        }
    }
}

impl RetryPolicy {
    /// Backoff delay for the given 1-based attempt number:
    /// `min(attempt * base_delay, max_delay)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        cmp::min(self.base_delay * attempt, self.max_delay)
    }
}

/// Stateful backoff sequence for one reconnect cycle.
#[derive(Debug)]
pub struct Backoff {
    policy: RetryPolicy,
    attempt: u32,
    started: Instant,
}

impl Backoff {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempt: 0,
            started: Instant::now(),
        }
    }

    /// Delay before the next attempt, or `None` once the attempt or time
    /// budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        self.attempt += 1;
        if self.attempt > self.policy.max_attempts
            || self.started.elapsed() > self.policy.max_elapsed
        {
            return None;
        }
        Some(self.policy.delay_for(self.attempt))
    }

    /// 1-based number of the attempt most recently handed out
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_linearly_with_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(5), Duration::from_millis(500));
        assert_eq!(policy.delay_for(10), Duration::from_millis(1000));
    }

    #[test]
    fn delay_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(30), Duration::from_secs(3));
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn backoff_stops_after_max_attempts() {
        let mut backoff = Backoff::new(RetryPolicy::default());
        for attempt in 1..=10 {
            let delay = backoff.next_delay();
            assert_eq!(delay, Some(RetryPolicy::default().delay_for(attempt)));
        }
        // The 11th refusal must not schedule another attempt.
        assert_eq!(backoff.next_delay(), None);
        assert_eq!(backoff.next_delay(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_stops_after_max_elapsed() {
        let policy = RetryPolicy {
            max_attempts: u32::MAX,
            ..RetryPolicy::default()
        };
        let mut backoff = Backoff::new(policy);
        assert!(backoff.next_delay().is_some());

        tokio::time::advance(Duration::from_secs(3601)).await;
        assert_eq!(backoff.next_delay(), None);
    }
}
