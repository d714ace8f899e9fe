//! Bounded exponential-backoff retry policy.
//!
//! The policy itself is retry-kind-agnostic: callers pass a predicate that
//! decides whether a given error is worth retrying. On exhaustion the last
//! error is propagated unchanged.

use std::future::Future;
use std::time::Duration;

/// Tunable parameters for the exponential-backoff strategy.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Delay before the first retry attempt.
    pub base_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
        }
    }
}

/// Delay before retrying after `attempt` failed attempts (0-based).
///
/// Computed as `base_delay * 2^attempt`, clamped to
/// [`RetryConfig::max_delay`].
pub fn backoff_delay(attempt: u32, config: &RetryConfig) -> Duration {
    // Cap the shift so the multiplication cannot overflow; the clamp
    // below makes anything past 2^16 indistinguishable anyway.
    let factor = 1u128 << attempt.min(16);
    let delay_ms = config.base_delay.as_millis().saturating_mul(factor);
    Duration::from_millis(delay_ms.min(config.max_delay.as_millis()) as u64)
}

/// Execute `operation` with up to `max_retries` retries.
///
/// `operation` receives the 0-based attempt number. After a failure, the
/// error is retried only while `is_retryable` returns `true` and retries
/// remain; `max_retries = 0` means "attempt once, no retry". The final
/// error is returned to the caller unchanged.
pub async fn retry_with_backoff<T, E, F, Fut, R>(
    max_retries: u32,
    config: &RetryConfig,
    is_retryable: R,
    mut operation: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
{
    let mut attempt = 0u32;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if attempt >= max_retries || !is_retryable(&error) {
                    return Err(error);
                }
                let delay = backoff_delay(attempt, config);
                tracing::warn!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Attempt failed, backing off before retry",
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
