//! Exponential backoff for rate-limited and failing requests.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::error::ObaError;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry; doubles on each subsequent one.
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(1000);

/// Retry policy for a single request.
///
/// Retries only errors for which [`ObaError::is_retryable`] holds, waiting
/// `initial_backoff * 2^attempt` before each retry. No jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Run `op`, retrying retryable failures until the budget is spent.
    ///
    /// The last error is returned once retries are exhausted, or straight
    /// away for non-retryable errors.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, ObaError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ObaError>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = self.backoff(attempt);
                    warn!(
                        error = %e,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
