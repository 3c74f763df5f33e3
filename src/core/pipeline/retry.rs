//! Retry with exponential backoff for idempotent store calls
//!
//! Only errors that report [`crate::domain::HealthmarkError::is_retryable`]
//! are retried.
//! Appends must never go through here: a retried append after a lost
//! acknowledgement would duplicate rows.

use crate::config::RetryConfig;
use crate::domain::Result;
use crate::log_retry_attempt;
use std::future::Future;
use std::time::Duration;

/// Delay before retry number `attempt` (1-based), capped at `max_delay_ms`
pub fn backoff_delay(retry: &RetryConfig, attempt: usize) -> Duration {
    let exponent = attempt.saturating_sub(1) as i32;
    let delay = retry.initial_delay_ms as f64 * retry.backoff_multiplier.powi(exponent);
    let capped = delay.min(retry.max_delay_ms as f64).max(0.0);
    Duration::from_millis(capped as u64)
}

/// Runs `operation`, retrying retryable failures up to `retry.max_retries` times
pub async fn retry_idempotent<F, T, Fut>(
    retry: &RetryConfig,
    operation_name: &str,
    operation: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < retry.max_retries => {
                attempt += 1;
                let delay = backoff_delay(retry, attempt);
                log_retry_attempt!(attempt, retry.max_retries, e);
                tracing::debug!(
                    operation = operation_name,
                    delay_ms = delay.as_millis() as u64,
                    "Backing off before retry"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
