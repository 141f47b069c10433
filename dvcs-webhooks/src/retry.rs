//! Retry policy for webhook delivery

use crate::DeliveryError;
use std::time::Duration;

/// Retry policy configuration
///
/// The default is 3 retries after the initial attempt, waiting 2s, 4s and 8s.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt
    pub max_retries: u32,

    /// Delay before the first retry
    pub initial_delay: Duration,

    /// Maximum delay between retries
    pub max_delay: Duration,

    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with no retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Create a policy with a fixed number of retries
    pub fn fixed(retries: u32, delay: Duration) -> Self {
        Self {
            max_retries: retries,
            initial_delay: delay,
            max_delay: delay,
            backoff_multiplier: 1.0,
        }
    }

    /// Create a policy with exponential backoff
    pub fn exponential(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Delay to wait before retry number `retry` (1-indexed)
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
        let base_delay = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        let delay_secs = base_delay.min(self.max_delay.as_secs_f64());

        Duration::from_secs_f64(delay_secs)
    }

    /// Whether retry number `retry` (1-indexed) is allowed
    pub fn should_retry(&self, retry: u32) -> bool {
        retry <= self.max_retries
    }

    /// Total attempts an episode may make
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Result of a single delivery attempt, consumed by the retry loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptResult {
    /// Endpoint answered 2xx
    Success {
        /// Response status code
        status_code: u16,
    },

    /// Attempt failed, another attempt may succeed
    RetryableFailure(DeliveryError),

    /// Attempt failed, retrying cannot help
    TerminalFailure(DeliveryError),
}

impl AttemptResult {
    /// Classify a failure by whether it can be retried
    pub fn from_error(error: DeliveryError) -> Self {
        if error.is_retryable() {
            Self::RetryableFailure(error)
        } else {
            Self::TerminalFailure(error)
        }
    }

    /// Check if the result is successful
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Check if the result indicates a retry may be attempted
    pub fn should_retry(&self) -> bool {
        matches!(self, Self::RetryableFailure(_))
    }

    /// The failure carried by this result
    pub fn error(&self) -> Option<&DeliveryError> {
        match self {
            Self::Success { .. } => None,
            Self::RetryableFailure(e) | Self::TerminalFailure(e) => Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.max_attempts(), 4);
    }

    #[test]
    fn test_default_schedule_is_powers_of_two() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_for_retry(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for_retry(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for_retry(3), Duration::from_secs(8));
    }

    #[test]
    fn test_no_retries() {
        let policy = RetryPolicy::none();
        assert_eq!(policy.max_retries, 0);
        assert!(!policy.should_retry(1));
    }

    #[test]
    fn test_fixed_policy() {
        let policy = RetryPolicy::fixed(5, Duration::from_millis(10));
        assert_eq!(policy.max_retries, 5);

        // All delays should be the same
        assert_eq!(policy.delay_for_retry(1), policy.delay_for_retry(4));
    }

    #[test]
    fn test_max_delay_cap() {
        let policy = RetryPolicy {
            max_retries: 10,
            initial_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        };

        assert_eq!(policy.delay_for_retry(5), Duration::from_secs(30));
    }

    #[test]
    fn test_should_retry() {
        let policy = RetryPolicy::exponential(3);

        assert!(policy.should_retry(1));
        assert!(policy.should_retry(3));
        assert!(!policy.should_retry(4));
    }

    #[test]
    fn test_attempt_result_classification() {
        let retryable = AttemptResult::from_error(DeliveryError::Timeout(10_000));
        assert!(retryable.should_retry());

        let terminal =
            AttemptResult::from_error(DeliveryError::InvalidRequest("relative URL".into()));
        assert!(!terminal.should_retry());
        assert!(terminal.error().is_some());

        let success = AttemptResult::Success { status_code: 204 };
        assert!(success.is_success());
        assert!(success.error().is_none());
    }
}
