//! Fixed-backoff retry combinator for provider calls.
//!
//! Backoff is deliberately fixed, not exponential: providers are
//! low-QPS, cron-scheduled calls where a short constant pause is enough
//! and run-length predictability matters more than politeness curves.

use std::time::Duration;

use tracing::{error, warn};

use crate::error::{FetchError, FetchErrorKind};

/// Retry policy for one provider call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total number of invocations, including the first.
    pub attempts: u32,
    /// Fixed pause between attempts.
    pub backoff: Duration,
    /// Error kinds considered transient. Anything else propagates
    /// immediately without a retry.
    pub retry_on: Vec<FetchErrorKind>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_secs(15),
            retry_on: vec![
                FetchErrorKind::Network,
                FetchErrorKind::RateLimited,
                FetchErrorKind::Upstream,
            ],
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts,
            backoff,
            ..Self::default()
        }
    }

    #[must_use]
    fn is_transient(&self, kind: FetchErrorKind) -> bool {
        self.retry_on.contains(&kind)
    }
}

/// Why a retried call ultimately did not produce a value.
#[derive(Debug)]
pub enum RetryError {
    /// Every attempt failed with a transient error.
    Exhausted { attempts: u32, last: FetchError },
    /// A non-transient error ended the call immediately.
    Fatal(FetchError),
}

/// Invoke `f` under `policy`, surfacing the exhaustion case.
///
/// The orchestrator uses this form so it can attach a warning to the
/// module's degraded output; provider-internal callers usually want
/// [`with_retry`] instead.
pub fn try_with_retry<T>(
    policy: &RetryPolicy,
    mut f: impl FnMut() -> Result<T, FetchError>,
) -> Result<T, RetryError> {
    try_with_retry_impl(policy, &mut f, std::thread::sleep)
}

fn try_with_retry_impl<T>(
    policy: &RetryPolicy,
    f: &mut impl FnMut() -> Result<T, FetchError>,
    mut sleep: impl FnMut(Duration),
) -> Result<T, RetryError> {
    let attempts = policy.attempts.max(1);
    let mut last: Option<FetchError> = None;

    for attempt in 1..=attempts {
        match f() {
            Ok(value) => return Ok(value),
            Err(err) if policy.is_transient(err.kind()) => {
                warn!(attempt, attempts, error = %err, "transient fetch error");
                last = Some(err);
                if attempt < attempts {
                    sleep(policy.backoff);
                }
            }
            Err(err) => return Err(RetryError::Fatal(err)),
        }
    }

    // attempts >= 1, so at least one transient failure was recorded.
    let last = last.unwrap_or_else(|| FetchError::other("no attempts made"));
    error!(attempts, error = %last, "all retry attempts failed");
    Err(RetryError::Exhausted { attempts, last })
}

/// Invoke `f` under `policy`, degrading to `default` when all attempts
/// fail with transient errors. Non-transient errors still propagate:
/// aggregation must never hard-fail because one provider is down, but a
/// programming error should not be papered over either.
pub fn with_retry<T>(
    policy: &RetryPolicy,
    default: T,
    f: impl FnMut() -> Result<T, FetchError>,
) -> Result<T, FetchError> {
    match try_with_retry(policy, f) {
        Ok(value) => Ok(value),
        Err(RetryError::Exhausted { .. }) => Ok(default),
        Err(RetryError::Fatal(err)) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::from_millis(5))
    }

    #[test]
    fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&quick_policy(3), "default", || {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(FetchError::network("connection reset"))
            } else {
                Ok("fresh")
            }
        });
        assert_eq!(result.unwrap(), "fresh");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn exhaustion_returns_default_after_exact_attempt_count() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&quick_policy(3), "default", || {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<&str, _>(FetchError::network("down"))
        });
        assert_eq!(result.unwrap(), "default");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn non_transient_error_propagates_without_retry() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&quick_policy(3), "default", || {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<&str, _>(FetchError::parse("bad json"))
        });
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn sleeps_between_attempts_with_fixed_backoff() {
        let policy = RetryPolicy::new(4, Duration::from_secs(15));
        let mut sleeps = Vec::new();
        let mut f = || Err::<(), _>(FetchError::rate_limited("429"));
        let result = try_with_retry_impl(&policy, &mut f, |d| sleeps.push(d));
        assert!(matches!(
            result,
            Err(RetryError::Exhausted { attempts: 4, .. })
        ));
        // Between each pair of attempts, never after the last.
        assert_eq!(sleeps, vec![Duration::from_secs(15); 3]);
    }

    #[test]
    fn exhausted_carries_last_error() {
        let result = try_with_retry(&quick_policy(2), || {
            Err::<(), _>(FetchError::upstream("503"))
        });
        match result {
            Err(RetryError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 2);
                assert_eq!(last.to_string(), "503");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        let calls = AtomicU32::new(0);
        let _ = with_retry(&quick_policy(0), (), || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
