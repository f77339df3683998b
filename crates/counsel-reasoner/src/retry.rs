//! Bounded retry with per-attempt timeouts for external service calls

use crate::config::ReasonerConfig;
use counsel_domain::traits::ServiceError;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

/// How a call site retries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first
    pub max_attempts: u32,
    /// Timeout for each attempt
    pub timeout: Duration,
    /// Delay after the first failed attempt; doubles after each further one
    pub backoff_base: Duration,
}

impl RetryPolicy {
    /// Policy from the reasoner configuration
    pub fn from_config(config: &ReasonerConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            timeout: config.call_timeout(),
            backoff_base: config.backoff_base(),
        }
    }

    /// Same timeout, but no retries
    pub fn single_attempt(self) -> Self {
        Self {
            max_attempts: 1,
            ..self
        }
    }

    /// Delay after failed attempt number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.backoff_base.saturating_mul(2u32.pow(exponent))
    }
}

/// A call that failed after its retries were used up
#[derive(Error, Debug)]
pub enum CallError<E> {
    /// Every attempt ran out of time
    #[error("timed out after {attempts} attempt(s)")]
    TimedOut {
        /// Attempts made
        attempts: u32,
    },

    /// The service returned an error
    #[error("{error} (after {attempts} attempt(s))")]
    Service {
        /// Attempts made
        attempts: u32,
        /// Last error returned
        error: E,
    },
}

impl<E> CallError<E> {
    /// Attempts made before giving up
    pub fn attempts(&self) -> u32 {
        match self {
            CallError::TimedOut { attempts } | CallError::Service { attempts, .. } => *attempts,
        }
    }
}

/// Run `call` until it succeeds, fails permanently, or attempts run out
///
/// Timeouts and errors whose [`ServiceError::is_transient`] is true are
/// retried with exponential backoff; anything else returns immediately.
pub async fn call_with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut call: F,
) -> Result<T, CallError<E>>
where
    E: ServiceError,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        let failure = match timeout(policy.timeout, call()).await {
            Ok(Ok(value)) => {
                if attempt > 1 {
                    debug!(operation, attempt, "Call succeeded after retry");
                }
                return Ok(value);
            }
            Ok(Err(error)) if !error.is_transient() => {
                warn!(operation, attempt, error = %error, "Non-transient failure, not retrying");
                return Err(CallError::Service {
                    attempts: attempt,
                    error,
                });
            }
            Ok(Err(error)) => CallError::Service {
                attempts: attempt,
                error,
            },
            Err(_) => CallError::TimedOut { attempts: attempt },
        };

        if attempt >= max_attempts {
            warn!(operation, attempts = attempt, error = %failure, "Giving up");
            return Err(failure);
        }

        let delay = policy.backoff(attempt);
        warn!(
            operation,
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %failure,
            "Transient failure, retrying"
        );
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, thiserror::Error)]
    #[error("test error (transient: {0})")]
    struct TestError(bool);

    impl ServiceError for TestError {
        fn is_transient(&self) -> bool {
            self.0
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            timeout: Duration::from_millis(200),
            backoff_base: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy {
            max_attempts: 4,
            timeout: Duration::from_secs(1),
            backoff_base: Duration::from_millis(100),
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
    }

    #[test]
    fn test_policy_from_config() {
        let config = ReasonerConfig::default();
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.timeout, Duration::from_secs(60));
        assert_eq!(policy.single_attempt().max_attempts, 1);
    }

    #[tokio::test]
    async fn test_transient_errors_retried_until_success() {
        let calls = AtomicU32::new(0);
        let result = call_with_retry(&fast_policy(3), "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(TestError(true))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_attempts_escalate() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = call_with_retry(&fast_policy(3), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TestError(true)) }
        })
        .await;

        assert_eq!(result.unwrap_err().attempts(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_transient_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = call_with_retry(&fast_policy(3), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TestError(false)) }
        })
        .await;

        assert!(matches!(result, Err(CallError::Service { attempts: 1, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeouts_are_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), CallError<TestError>> =
            call_with_retry(&fast_policy(2), "test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    sleep(Duration::from_secs(5)).await;
                    Ok(())
                }
            })
            .await;

        assert!(matches!(result, Err(CallError::TimedOut { attempts: 2 })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
