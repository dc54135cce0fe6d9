//! Bounded exponential backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

/// Retry schedule for event delivery.
///
/// `max_retries` is the total number of attempts. The first attempt runs
/// immediately; the delay before retry `i` (counting from 1) is
/// `min(base_delay * 2^(i - 1), max_delay)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(5000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }

    /// Returns the delay before the given retry. Retry 0 is the first attempt.
    pub fn delay_for(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let exponent = (retry - 1).min(31);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    /// Returns the delays between consecutive attempts.
    pub fn schedule(&self) -> Vec<Duration> {
        (1..self.attempts()).map(|retry| self.delay_for(retry)).collect()
    }

    /// Total attempts; a zero budget still makes one attempt.
    pub fn attempts(&self) -> u32 {
        self.max_retries.max(1)
    }
}

/// Runs `operation` until it succeeds or the policy's attempts are spent.
///
/// The operation receives the 1-based attempt number. Returns the last
/// error when every attempt failed.
pub async fn retry_with_backoff<F, Fut, T, E>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = policy.attempts();
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(attempt, "operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) => {
                if attempt >= attempts {
                    tracing::error!(attempt, error = %error, "operation failed after all retries");
                    return Err(error);
                }

                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    attempt,
                    error = %error,
                    delay_ms = delay.as_millis() as u64,
                    "operation failed, retrying after delay"
                );
                sleep(delay).await;
            }
        }
    }
}
