// src/collect/retry.rs
//! Bounded retry with exponential backoff + jitter, an optional retry
//! predicate, and a timeout wrapper. The only side effect is the sleep
//! between attempts; no shared state is touched.

use anyhow::Error;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Computed delays never leave this band, jitter included.
pub const MIN_DELAY: Duration = Duration::from_millis(100);
pub const MAX_DELAY: Duration = Duration::from_millis(30_000);

#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    /// Retries after the initial attempt; `max_retries + 1` attempts total.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1_000),
            backoff_multiplier: 2.0,
        }
    }
}

/// Deadline exceeded. Distinguished from other failures so callers can see
/// it, but still eligible for retry like any other failure.
#[derive(Debug, thiserror::Error)]
#[error("operation timed out after {0:?}")]
pub struct TimeoutError(pub Duration);

/// Terminal failure after all permitted attempts, or after the retry
/// predicate rejected the last error.
#[derive(Debug, thiserror::Error)]
#[error("gave up after {attempts} attempts: {last_error}")]
pub struct RetryExhausted {
    /// Attempts actually performed, the initial try included.
    pub attempts: u32,
    pub last_error: Error,
}

/// Delay before the attempt following a failure of attempt `attempt`
/// (1-indexed): `base * multiplier^(attempt-1)`, ±25% symmetric jitter,
/// clamped to [`MIN_DELAY`, `MAX_DELAY`].
fn backoff_delay(cfg: &RetryConfig, attempt: u32) -> Duration {
    let base = cfg.base_delay.as_millis() as f64;
    let exp = base * cfg.backoff_multiplier.powi(attempt as i32 - 1);
    let jitter = exp * 0.25 * rand::rng().random_range(-1.0..=1.0);
    let ms = (exp + jitter).clamp(MIN_DELAY.as_millis() as f64, MAX_DELAY.as_millis() as f64);
    Duration::from_millis(ms as u64)
}

/// Attempt `op` up to `max_retries + 1` times, sleeping between failures.
pub async fn with_retry<T, F, Fut>(cfg: &RetryConfig, op: F) -> Result<T, RetryExhausted>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    with_retry_if(cfg, op, |_, _| true).await
}

/// Like [`with_retry`], but consults `should_retry(error, attempt)` after
/// each failure; a `false` stops immediately instead of exhausting the
/// remaining budget.
pub async fn with_retry_if<T, F, Fut, P>(
    cfg: &RetryConfig,
    mut op: F,
    mut should_retry: P,
) -> Result<T, RetryExhausted>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
    P: FnMut(&Error, u32) -> bool,
{
    let total = cfg.max_retries.saturating_add(1);
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= total || !should_retry(&err, attempt) {
                    return Err(RetryExhausted {
                        attempts: attempt,
                        last_error: err,
                    });
                }
                let delay = backoff_delay(cfg, attempt);
                tracing::debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "attempt failed, backing off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Race `fut` against a timer; exceeding `limit` fails with [`TimeoutError`].
pub async fn with_timeout<T, Fut>(limit: Duration, fut: Fut) -> Result<T, Error>
where
    Fut: Future<Output = Result<T, Error>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(TimeoutError(limit).into()),
    }
}

/// HTTP-aware retry classification for adapter calls.
///
/// Retryable: timeouts, connect/network failures, HTTP 5xx, 429, 408.
/// Not retryable: any other HTTP status carried by the error — an explicit
/// non-retryable status overrides retryable signals in the same error.
/// Errors with no HTTP information default to retryable.
pub fn is_retryable(err: &Error, _attempt: u32) -> bool {
    if err.downcast_ref::<TimeoutError>().is_some() {
        return true;
    }
    for cause in err.chain() {
        if let Some(req_err) = cause.downcast_ref::<reqwest::Error>() {
            if let Some(status) = req_err.status() {
                return status.is_server_error() || matches!(status.as_u16(), 408 | 429);
            }
            return req_err.is_timeout() || req_err.is_connect();
        }
    }
    true
}
