//! Retry state machine for transient catalog failures.
//!
//! The policy is data; the caller drives it. A worker asks the resolver,
//! and on a transient failure records it here to learn whether to sleep and
//! try again or give up:
//!
//! ```
//! use posterwall::metadata::retry::{RetryDecision, RetryPolicy};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::default();
//! let mut state = policy.start();
//! assert_eq!(state.record_failure(), RetryDecision::RetryAfter(Duration::from_millis(500)));
//! assert_eq!(state.record_failure(), RetryDecision::RetryAfter(Duration::from_millis(1000)));
//! assert_eq!(state.record_failure(), RetryDecision::GiveUp);
//! ```

use std::time::Duration;

use crate::config::RetryConfig;

/// Exponential backoff parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the second attempt.
    pub base_delay: Duration,
    /// Multiplier applied to the delay after every further failure.
    pub factor: u32,
    /// Total attempts, the first one included.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            base_delay: Duration::from_millis(config.base_delay_ms),
            factor: config.factor.max(1),
            max_attempts: config.max_attempts.max(1),
        }
    }
}

impl RetryPolicy {
    /// Begin tracking a new call.
    pub fn start(&self) -> RetryState {
        RetryState {
            policy: *self,
            attempt: 0,
        }
    }

    /// Delay to wait after the `failures`-th failure (1-based).
    pub fn delay_after(&self, failures: u32) -> Duration {
        let exp = failures.saturating_sub(1);
        let multiplier = self.factor.checked_pow(exp).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(multiplier)
    }
}

/// What the caller should do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for the given delay, then try again.
    RetryAfter(Duration),
    /// The attempt budget is spent.
    GiveUp,
}

/// Per-call retry progress.
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    attempt: u32,
}

impl RetryState {
    /// Number of failed attempts recorded so far.
    pub fn failures(&self) -> u32 {
        self.attempt
    }

    /// Whether another attempt is still allowed.
    pub fn can_retry(&self) -> bool {
        self.attempt < self.policy.max_attempts
    }

    /// Delay that would follow the next recorded failure.
    pub fn next_delay(&self) -> Duration {
        self.policy.delay_after(self.attempt + 1)
    }

    /// Record a transient failure and decide what happens next.
    pub fn record_failure(&mut self) -> RetryDecision {
        let delay = self.next_delay();
        self.attempt += 1;
        if self.can_retry() {
            RetryDecision::RetryAfter(delay)
        } else {
            RetryDecision::GiveUp
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.base_delay, Duration::from_millis(500));
        assert_eq!(policy.factor, 2);
        assert_eq!(policy.max_attempts, 3);
    }

    #[test]
    fn test_exponential_delays() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(100),
            factor: 3,
            max_attempts: 5,
        };
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(300));
        assert_eq!(policy.delay_after(3), Duration::from_millis(900));
    }

    #[test]
    fn test_single_attempt_gives_up_immediately() {
        let policy = RetryPolicy {
            max_attempts: 1,
            ..RetryPolicy::default()
        };
        let mut state = policy.start();
        assert!(state.can_retry());
        assert_eq!(state.record_failure(), RetryDecision::GiveUp);
        assert_eq!(state.failures(), 1);
        assert!(!state.can_retry());
    }

    #[test]
    fn test_delay_saturates() {
        let policy = RetryPolicy {
            base_delay: Duration::from_secs(1),
            factor: 10,
            max_attempts: 100,
        };
        assert!(policy.delay_after(50) >= Duration::from_secs(u32::MAX as u64));
    }

    #[test]
    fn test_zero_config_values_are_clamped() {
        let config = RetryConfig {
            base_delay_ms: 0,
            factor: 0,
            max_attempts: 0,
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.factor, 1);
        assert_eq!(policy.max_attempts, 1);
    }
}
