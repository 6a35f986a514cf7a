//! Retry-with-backoff executor for calls to rate-limited services.
//!
//! A call is attempted at most `max_attempts` times. Only transient capacity
//! failures (rate limiting, quota exhaustion) are retried; the wait before
//! attempt `n + 1` is `base_wait * (n + 1)`. Any other failure is surfaced on
//! first occurrence.

use crate::error::{LabError, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Default number of attempts per call.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base wait between attempts.
pub const DEFAULT_BASE_WAIT: Duration = Duration::from_secs(10);

/// Attempt bound and wait unit for the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_wait: DEFAULT_BASE_WAIT,
        }
    }
}

/// What happened on a single attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    RateLimited,
    Failure(String),
}

/// One call attempt made by the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryAttempt {
    /// 0-based attempt index
    pub index: u32,
    pub outcome: AttemptOutcome,
    /// Suspension before the next attempt (zero when none follows)
    pub wait: Duration,
}

/// Terminal result of an executed call.
#[derive(Debug)]
pub enum RetryOutcome<T> {
    /// The call succeeded
    Completed(T),
    /// Every attempt hit a transient capacity failure
    Exhausted { attempts: u32, last_error: LabError },
    /// A non-transient failure stopped the executor
    Failed(LabError),
}

/// Outcome plus the per-attempt log.
#[derive(Debug)]
pub struct RetryReport<T> {
    pub outcome: RetryOutcome<T>,
    pub attempts: Vec<RetryAttempt>,
}

impl<T> RetryReport<T> {
    /// Number of underlying calls that were issued.
    pub fn calls(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.outcome, RetryOutcome::Exhausted { .. })
    }

    /// Flatten into a `Result`, mapping exhaustion to `RetriesExhausted`.
    pub fn into_result(self) -> Result<T> {
        match self.outcome {
            RetryOutcome::Completed(value) => Ok(value),
            RetryOutcome::Exhausted { attempts, last_error } => Err(LabError::RetriesExhausted {
                attempts,
                last: last_error.to_string(),
            }),
            RetryOutcome::Failed(err) => Err(err),
        }
    }
}

impl RetryPolicy {
    /// Create a policy. `max_attempts` must be at least 1.
    pub fn new(max_attempts: u32, base_wait: Duration) -> Result<Self> {
        if max_attempts == 0 {
            return Err(LabError::malformed("max_attempts must be at least 1"));
        }
        Ok(Self {
            max_attempts,
            base_wait,
        })
    }

    /// Policy that never retries.
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            base_wait: Duration::ZERO,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_wait(&self) -> Duration {
        self.base_wait
    }

    /// Wait applied after the failed attempt `attempt_index`.
    pub fn wait_after(&self, attempt_index: u32) -> Duration {
        self.base_wait.saturating_mul(attempt_index.saturating_add(1))
    }

    /// Run `call` under this policy.
    ///
    /// Attempts are strictly sequential; the calling task is suspended for
    /// the backoff between attempts.
    pub async fn execute<T, F, Fut>(&self, mut call: F) -> RetryReport<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempts = Vec::with_capacity(self.max_attempts as usize);

        for index in 0..self.max_attempts {
            match call().await {
                Ok(value) => {
                    attempts.push(RetryAttempt {
                        index,
                        outcome: AttemptOutcome::Success,
                        wait: Duration::ZERO,
                    });
                    debug!(attempt = index, "call succeeded");
                    return RetryReport {
                        outcome: RetryOutcome::Completed(value),
                        attempts,
                    };
                }
                Err(err) if err.is_transient() => {
                    let is_last = index + 1 == self.max_attempts;
                    let wait = if is_last {
                        Duration::ZERO
                    } else {
                        self.wait_after(index)
                    };
                    attempts.push(RetryAttempt {
                        index,
                        outcome: AttemptOutcome::RateLimited,
                        wait,
                    });

                    if is_last {
                        warn!(attempts = self.max_attempts, error = %err, "retries exhausted");
                        return RetryReport {
                            outcome: RetryOutcome::Exhausted {
                                attempts: self.max_attempts,
                                last_error: err,
                            },
                            attempts,
                        };
                    }

                    warn!(
                        attempt = index,
                        wait_secs = wait.as_secs_f64(),
                        error = %err,
                        "capacity limit hit, backing off"
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(err) => {
                    attempts.push(RetryAttempt {
                        index,
                        outcome: AttemptOutcome::Failure(err.to_string()),
                        wait: Duration::ZERO,
                    });
                    return RetryReport {
                        outcome: RetryOutcome::Failed(err),
                        attempts,
                    };
                }
            }
        }

        // Only reachable by a deserialized policy with zero attempts.
        RetryReport {
            outcome: RetryOutcome::Failed(LabError::malformed("retry policy allows no attempts")),
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_secs(10)).unwrap()
    }

    #[test]
    fn test_zero_attempts_rejected() {
        assert!(RetryPolicy::new(0, Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_linear_wait() {
        let p = policy(3);
        assert_eq!(p.wait_after(0), Duration::from_secs(10));
        assert_eq!(p.wait_after(1), Duration::from_secs(20));
        assert_eq!(p.wait_after(2), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_transient_exhausts_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let started = tokio::time::Instant::now();

        let report = policy(3)
            .execute(|| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(LabError::transient("429 Too Many Requests"))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(report.calls(), 3);
        assert!(report.is_exhausted());
        // 10s + 20s, nothing after the final attempt
        assert_eq!(started.elapsed(), Duration::from_secs(30));
        assert_eq!(report.attempts[2].wait, Duration::ZERO);
        assert!(matches!(
            report.into_result(),
            Err(LabError::RetriesExhausted { attempts: 3, .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_error_stops_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let report = policy(3)
            .execute(|| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(LabError::unauthorized("API key not valid"))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(report.outcome, RetryOutcome::Failed(LabError::Unauthorized(_))));
        assert_eq!(
            report.attempts[0].outcome,
            AttemptOutcome::Failure("Unauthorized: API key not valid".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let report = policy(3)
            .execute(|| {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(LabError::transient("quota exceeded"))
                    } else {
                        Ok("answer")
                    }
                }
            })
            .await;

        assert_eq!(report.calls(), 2);
        assert_eq!(report.attempts[0].outcome, AttemptOutcome::RateLimited);
        assert_eq!(report.attempts[0].wait, Duration::from_secs(10));
        assert_eq!(report.attempts[1].outcome, AttemptOutcome::Success);
        assert_eq!(report.into_result().unwrap(), "answer");
    }

    #[tokio::test]
    async fn test_single_attempt_policy() {
        let report = RetryPolicy::single_attempt()
            .execute(|| async { Err::<(), _>(LabError::transient("rate limit")) })
            .await;
        assert_eq!(report.calls(), 1);
        assert!(report.is_exhausted());
    }
}
