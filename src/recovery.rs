//! Retry and timeout helpers for calls to the embedding service.
//!
//! Transient failures (connection refused, timeouts, HTTP 429 and 5xx) are
//! retried with exponential backoff and jitter. Everything else is returned
//! to the caller on the first attempt.
//!
//! # Example
//!
//! ```rust,ignore
//! use prompt_evolver::recovery::{with_timeout, RetryPolicy};
//! use std::time::Duration;
//!
//! let policy = RetryPolicy::default();
//! let vector = policy
//!     .run("embed", || with_timeout(Duration::from_secs(10), oracle.embed(text)))
//!     .await?;
//! ```

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use crate::constants::{DEFAULT_MAX_RETRIES, RETRY_BASE_DELAY_MS, RETRY_MAX_DELAY_MS};
use crate::error::{Error, Result};

// =============================================================================
// RETRY POLICY
// =============================================================================

/// Exponential backoff policy for transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. Zero disables retrying.
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    pub base_delay_ms: u64,
    /// Upper bound for the un-jittered delay in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: RETRY_BASE_DELAY_MS,
            max_delay_ms: RETRY_MAX_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the default delays and `max_retries` retries.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(0)
    }

    /// Set the backoff delays.
    pub fn with_delays(mut self, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self.max_delay_ms = max_delay_ms.max(base_delay_ms);
        self
    }

    /// Delay before retry number `attempt` (1-based), with 0-25% jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        let capped = self
            .base_delay_ms
            .saturating_mul(2u64.pow(exponent))
            .min(self.max_delay_ms);

        let jitter = (capped as f64 * 0.25 * rand::thread_rng().gen::<f64>()) as u64;
        Duration::from_millis(capped + jitter)
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// retry budget is spent. The last error is returned.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                let delay = self.delay_for(attempt);
                debug!(
                    operation = label,
                    attempt = attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying"
                );
                tokio::time::sleep(delay).await;
            }

            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if is_retryable_error(&e) && attempt < self.max_retries => {
                    warn!(
                        operation = label,
                        attempt = attempt,
                        error = %e,
                        "Transient error, will retry"
                    );
                }
                Err(e) => return Err(e),
            }

            attempt += 1;
        }
    }
}

// =============================================================================
// TIMEOUT WRAPPER
// =============================================================================

/// Execute a future with a timeout, mapping elapsed time to [`Error::ApiTimeout`].
pub async fn with_timeout<T, F: Future<Output = Result<T>>>(
    duration: Duration,
    future: F,
) -> Result<T> {
    tokio::time::timeout(duration, future)
        .await
        .map_err(|_| Error::api_timeout(duration.as_secs()))?
}

// =============================================================================
// ERROR CLASSIFICATION
// =============================================================================

/// Check if an error is worth retrying.
pub fn is_retryable_error(error: &Error) -> bool {
    match error {
        Error::ApiTimeout { .. } | Error::ApiConnectionFailed { .. } => true,
        Error::ApiResponse { status, .. } => *status == 429 || (500..=504).contains(status),
        Error::Http(e) => {
            if let Some(status) = e.status() {
                let code = status.as_u16();
                return code == 429 || (500..=504).contains(&code);
            }
            e.is_connect() || e.is_timeout()
        }
        _ => false,
    }
}
