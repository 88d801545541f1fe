//! Bounded retry with exponential backoff
//!
//! Applies only to transient resource-exhaustion errors from the generation
//! collaborator. Non-retriable errors propagate immediately without
//! consuming an attempt; a server retry-after hint overrides the computed
//! backoff for that step.

use crate::error::EngineError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Retry schedule for the generation seam
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    /// Backoff for the first retry; doubles each step
    pub base_delay: Duration,
    /// Ceiling for any single backoff step
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries (single attempt)
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Run `op`, retrying transient failures per this policy
    ///
    /// # Errors
    /// Propagates the first non-retriable error untouched; wraps a final
    /// transient failure in [`EngineError::RetriesExhausted`].
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, EngineError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, EngineError>>,
    {
        let mut attempt = 1u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) if attempt >= self.max_attempts => {
                    return Err(EngineError::RetriesExhausted {
                        attempts: attempt,
                        source: Box::new(err),
                    });
                }
                Err(err) => {
                    let delay = err.retry_after().unwrap_or_else(|| self.backoff(attempt));
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient generation error; backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Exponential backoff with up to 25% random jitter
    fn backoff(&self, attempt: u32) -> Duration {
        let exp = self.base_delay.saturating_mul(1u32 << (attempt - 1).min(16));
        let capped = exp.min(self.max_delay);
        let jitter = rand::rng().random_range(0.0..0.25);
        capped.mul_f64(1.0 + jitter)
    }
}
