//! Bounded retries with exponential backoff for backing-store calls.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio_retry::RetryIf;
use tracing::warn;

use crate::error::StoreError;

/// Retry settings for a single store operation.
///
/// Only [`StoreError::Transient`] failures are retried. The delay before
/// attempt `i` (0-indexed, `i >= 1`) is `base_delay * 2^(i-1)`; the first
/// attempt runs immediately. The policy holds no mutable state, so a single
/// value can be shared by any number of concurrent callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy. `max_attempts` is clamped to at least one attempt.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delays applied before the second, third, ... attempt.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + use<> {
        let base = self.base_delay;
        (1..self.max_attempts).map(move |attempt| {
            let exponent = (attempt - 1).min(31);
            base.saturating_mul(1u32 << exponent)
        })
    }

    /// Runs `operation` until it succeeds, fails permanently, or runs out of
    /// attempts. The last observed error is returned unchanged.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let attempts = AtomicU32::new(0);

        let action = || {
            attempts.fetch_add(1, Ordering::Relaxed);
            operation()
        };
        let should_retry = |e: &StoreError| {
            if self.will_retry(attempts.load(Ordering::Relaxed), e) {
                metrics::counter!("store_retries_total").increment(1);
                warn!("Retrying store operation after transient failure: {}", e);
            }
            e.is_transient()
        };

        RetryIf::spawn(self.delays(), action, should_retry).await
    }

    /// Whether a failure of attempt number `attempt` (1-based) is followed by
    /// another attempt.
    fn will_retry(&self, attempt: u32, error: &StoreError) -> bool {
        error.is_transient() && attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(100))
    }
}
