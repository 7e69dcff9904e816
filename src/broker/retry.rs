//! Redis operation retry
//!
//! Connection-class failures (refused, dropped, timed out) are retried with
//! exponential backoff and jitter; everything else is returned immediately.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::RedisConfig;

/// Whether a Redis error is worth another attempt
pub fn is_retryable_error(err: &redis::RedisError) -> bool {
    err.is_connection_refusal()
        || err.is_connection_dropped()
        || err.is_timeout()
        || err.is_io_error()
}

/// Retry settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

impl From<&RedisConfig> for RetryConfig {
    fn from(config: &RedisConfig) -> Self {
        Self {
            max_retries: config.connect_retries,
            base_delay_ms: config.retry_base_delay_ms,
            max_delay_ms: config.retry_max_delay_ms.max(config.retry_base_delay_ms),
        }
    }
}

/// Run a Redis operation, retrying connection-class errors
pub async fn with_retry<T, F, Fut>(
    operation_name: &str,
    config: RetryConfig,
    operation: F,
) -> Result<T, redis::RedisError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, redis::RedisError>>,
{
    with_retry_if(operation_name, config, is_retryable_error, operation).await
}

/// Exponential backoff executor with a caller-supplied retry predicate
pub async fn with_retry_if<T, E, F, Fut, P>(
    operation_name: &str,
    config: RetryConfig,
    retryable: P,
    mut operation: F,
) -> Result<T, E>
where
    E: Display,
    P: Fn(&E) -> bool,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(
                        "Operation '{}' succeeded after {} retries",
                        operation_name, attempt
                    );
                }
                return Ok(result);
            }
            Err(e) if retryable(&e) && attempt < config.max_retries => {
                attempt += 1;
                let delay = calculate_backoff(attempt, config.base_delay_ms, config.max_delay_ms);
                warn!(
                    "Operation '{}' failed (attempt {}/{}): {}; retrying in {} ms",
                    operation_name,
                    attempt,
                    config.max_retries + 1,
                    e,
                    delay
                );
                sleep(Duration::from_millis(delay)).await;
            }
            Err(e) => {
                if !retryable(&e) {
                    debug!(
                        "Operation '{}' failed with non-retryable error: {}",
                        operation_name, e
                    );
                }
                return Err(e);
            }
        }
    }
}

/// Exponential delay with 0-25% jitter
fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> u64 {
    use rand::RngExt;
    let exp_delay = base_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
    let capped = exp_delay.min(max_ms);
    let jitter = rand::rng().random_range(0..=capped / 4);
    capped.saturating_add(jitter)
}
