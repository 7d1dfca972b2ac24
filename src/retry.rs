//! Retry harness with configurable backoff and jitter.
//!
//! Wraps transient failures (storage I/O, 5xx network responses) in bounded
//! retries. Deterministic failures (validation, security, conversion) are
//! surfaced immediately. Sleeping goes through the [`Sleeper`] trait so tests
//! never wait on real time, and every wait races against the caller's
//! cancellation token: a request cancelled mid-backoff returns
//! [`Error::Cancelled`] instead of sleeping out the delay.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::errors::{Error, Result};

/// Backoff growth strategy between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `base * 2^(attempt-1)`
    Exponential,
    /// `base * attempt`
    Linear,
    /// `base`
    Fixed,
}

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: bool,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter: true,
            backoff: Backoff::Exponential,
        }
    }
}

impl RetryPolicy {
    /// Policy for storage I/O: 3 attempts, 1 s exponential base.
    pub fn storage() -> Self {
        Self::default()
    }

    /// Policy for document conversion: 2 attempts, 500 ms exponential base.
    pub fn conversion() -> Self {
        Self {
            max_attempts: 2,
            base_delay: Duration::from_millis(500),
            ..Self::default()
        }
    }

    /// Base delay before the next attempt, capped at `max_delay`.
    /// Jitter is applied separately.
    pub fn delay(&self, attempt: u32) -> Duration {
        let delay = match self.backoff {
            Backoff::Exponential => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                self.base_delay.saturating_mul(factor)
            }
            Backoff::Linear => self.base_delay.saturating_mul(attempt.max(1)),
            Backoff::Fixed => self.base_delay,
        };
        delay.min(self.max_delay)
    }
}

/// Multiplies a delay by a uniform factor in `[0.75, 1.25)`.
pub fn apply_jitter(delay: Duration) -> Duration {
    let factor: f64 = rand::thread_rng().gen_range(0.75..1.25);
    delay.mul_f64(factor)
}

/// Clock seam for the harness. Production uses [`TokioSleeper`]; tests
/// substitute a recording fake so retries complete instantly.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] over `tokio::time::sleep`.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Runs `op` up to `policy.max_attempts` times.
///
/// `op` receives the 1-based attempt number. Non-retryable errors are
/// returned as-is on first occurrence; when the attempt budget is exhausted
/// the last error is wrapped in [`Error::RetriesExhausted`] carrying the
/// attempt count. Backoff sleeps race against `cancel`: a cancellation
/// observed while waiting aborts the harness with [`Error::Cancelled`].
pub async fn retry<T, F, Fut>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_err: Option<Error> = None;

    for attempt in 1..=policy.max_attempts {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_retryable() {
                    return Err(err);
                }
                tracing::debug!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    error = %err,
                    "transient failure, will retry"
                );
                last_err = Some(err);
            }
        }

        if attempt < policy.max_attempts {
            let mut delay = policy.delay(attempt);
            if policy.jitter {
                delay = apply_jitter(delay);
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = sleeper.sleep(delay) => {}
            }
        }
    }

    Err(Error::RetriesExhausted {
        attempts: policy.max_attempts,
        source: Box::new(last_err.unwrap_or(Error::Internal("retry exhausted with no error".into()))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    struct RecordingSleeper {
        slept: Mutex<Vec<Duration>>,
    }

    impl RecordingSleeper {
        fn new() -> Self {
            Self {
                slept: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.slept.lock().unwrap().push(duration);
        }
    }

    /// Cancels its token the moment the harness starts waiting, then never
    /// returns, so only the cancellation branch can complete the select.
    struct CancelDuringSleep {
        token: CancellationToken,
    }

    #[async_trait]
    impl Sleeper for CancelDuringSleep {
        async fn sleep(&self, _duration: Duration) {
            self.token.cancel();
            std::future::pending::<()>().await;
        }
    }

    fn transient() -> Error {
        Error::storage("op", None, std::io::Error::other("flaky"))
    }

    #[tokio::test]
    async fn succeeds_without_retrying() {
        let sleeper = RecordingSleeper::new();
        let cancel = CancellationToken::new();
        let result: Result<i32> =
            retry(&RetryPolicy::default(), &sleeper, &cancel, |_| async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
        assert!(sleeper.slept.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let sleeper = RecordingSleeper::new();
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);
        let result: Result<&str> = retry(&RetryPolicy::default(), &sleeper, &cancel, |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(transient())
                } else {
                    Ok("done")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(sleeper.slept.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn non_retryable_errors_surface_immediately() {
        let sleeper = RecordingSleeper::new();
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry(&RetryPolicy::default(), &sleeper, &cancel, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::validation("type", "bad")) }
        })
        .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.slept.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn exhaustion_wraps_with_attempt_count() {
        let sleeper = RecordingSleeper::new();
        let cancel = CancellationToken::new();
        let result: Result<()> =
            retry(&RetryPolicy::default(), &sleeper, &cancel, |_| async { Err(transient()) })
                .await;
        match result.unwrap_err() {
            Error::RetriesExhausted { attempts, source } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*source, Error::Storage { .. }));
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn pre_cancelled_token_aborts_the_first_wait() {
        let sleeper = RecordingSleeper::new();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry(&RetryPolicy::default(), &sleeper, &cancel, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(transient()) }
        })
        .await;
        assert!(matches!(result.unwrap_err(), Error::Cancelled));
        // The first attempt ran; the backoff before the second did not.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.slept.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancellation_during_sleep_aborts_the_retry() {
        let cancel = CancellationToken::new();
        let sleeper = CancelDuringSleep {
            token: cancel.clone(),
        };
        let calls = AtomicU32::new(0);
        let result: Result<()> = retry(&RetryPolicy::default(), &sleeper, &cancel, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(transient()) }
        })
        .await;
        assert!(matches!(result.unwrap_err(), Error::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exponential_backoff_progression() {
        let sleeper = RecordingSleeper::new();
        let cancel = CancellationToken::new();
        let policy = RetryPolicy {
            jitter: false,
            ..RetryPolicy::default()
        };
        let _: Result<()> = retry(&policy, &sleeper, &cancel, |_| async { Err(transient()) }).await;
        let slept = sleeper.slept.lock().unwrap();
        assert_eq!(*slept, vec![Duration::from_secs(1), Duration::from_secs(2)]);
    }

    #[test]
    fn delay_strategies_and_cap() {
        let policy = RetryPolicy {
            base_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(30),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay(1), Duration::from_secs(10));
        assert_eq!(policy.delay(2), Duration::from_secs(20));
        // 10 * 2^2 = 40 caps at 30.
        assert_eq!(policy.delay(3), Duration::from_secs(30));

        let linear = RetryPolicy {
            backoff: Backoff::Linear,
            base_delay: Duration::from_secs(2),
            ..RetryPolicy::default()
        };
        assert_eq!(linear.delay(3), Duration::from_secs(6));

        let fixed = RetryPolicy {
            backoff: Backoff::Fixed,
            base_delay: Duration::from_secs(2),
            ..RetryPolicy::default()
        };
        assert_eq!(fixed.delay(5), Duration::from_secs(2));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let base = Duration::from_secs(4);
        for _ in 0..100 {
            let jittered = apply_jitter(base);
            assert!(jittered >= base.mul_f64(0.75));
            assert!(jittered < base.mul_f64(1.25));
        }
    }

    #[test]
    fn conversion_policy_defaults() {
        let p = RetryPolicy::conversion();
        assert_eq!(p.max_attempts, 2);
        assert_eq!(p.base_delay, Duration::from_millis(500));
        assert_eq!(p.backoff, Backoff::Exponential);
    }
}
