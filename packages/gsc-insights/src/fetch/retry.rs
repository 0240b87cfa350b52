//! Exponential backoff for transient failures.
//!
//! Only HTTP 429 and 5xx are retried. Everything else, including failures
//! with no status at all, propagates on the first attempt. The final error
//! is returned unchanged so callers can still classify it.

use std::future::Future;
use std::time::Duration;

use crate::error::Result;
use crate::types::config::RetryPolicy;

/// Delay before the retry that follows failed attempt `attempt` (0-based).
///
/// `base × 2^attempt × (0.5 + jitter)` with `jitter` in `[0, 0.5)`, so the
/// delay never drops below half the pure exponential value.
pub fn backoff_delay(base: Duration, attempt: u32, jitter: f64) -> Duration {
    let factor = 0.5 + jitter.clamp(0.0, 0.5);
    let exponential = base.saturating_mul(1u32 << attempt.min(31));
    exponential.mul_f64(factor)
}

/// Run `operation` until it succeeds, fails permanently, or
/// `policy.max_attempts` tries are used up.
///
/// `operation` is called afresh for every attempt.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_retryable() || attempt + 1 >= max_attempts {
                    return Err(err);
                }

                let delay = backoff_delay(policy.base_delay(), attempt, rand::random::<f64>() * 0.5);
                tracing::warn!(
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    status = ?err.status,
                    error = %err,
                    "Transient error, retrying after backoff"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InsightsError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(4, Duration::from_millis(1000))
    }

    #[test]
    fn test_backoff_delay_bounds() {
        let base = Duration::from_millis(1000);
        assert_eq!(backoff_delay(base, 0, 0.0), Duration::from_millis(500));
        assert_eq!(backoff_delay(base, 2, 0.0), Duration::from_millis(2000));
        assert!(backoff_delay(base, 2, 0.4999) < Duration::from_millis(4000));
        // Out-of-range jitter is clamped.
        assert_eq!(backoff_delay(base, 1, 7.0), Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_503_then_succeeds() {
        let attempts = Mutex::new(Vec::new());

        let result = with_retry(&policy(), || async {
            let mut stamps = attempts.lock().unwrap();
            stamps.push(Instant::now());
            if stamps.len() <= 3 {
                Err(InsightsError::from_status(Some(503), "Backend Error"))
            } else {
                Ok("rows")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "rows");
        let stamps = attempts.into_inner().unwrap();
        assert_eq!(stamps.len(), 4);

        // Delay i lies in [base * 2^i * 0.5, base * 2^i).
        for (i, pair) in stamps.windows(2).enumerate() {
            let full = Duration::from_millis(1000 * 2u64.pow(i as u32));
            let waited = pair[1] - pair[0];
            assert!(waited >= full / 2, "delay {} too short: {:?}", i, waited);
            assert!(waited < full, "delay {} too long: {:?}", i, waited);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_404_not_retried() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result: Result<()> = with_retry(&policy(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(InsightsError::from_status(Some(404), "Not found"))
        })
        .await;

        assert_eq!(result.unwrap_err().status, Some(404));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_status_not_retried() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = with_retry(&policy(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(InsightsError::from_status(None, "connection reset by peer"))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error_unchanged() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = with_retry(&policy(), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            Err(InsightsError::from_status(Some(429), format!("Rate limited #{}", n)))
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(err.status, Some(429));
        assert_eq!(err.message, "Rate limited #3");
    }
}
