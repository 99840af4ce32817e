use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable as _};
use tracing::warn;

/// Errors that may succeed when the whole unit of work is run again,
/// e.g. a lost compare-and-swap or a serialization failure.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_BASE_DELAY_MS: u64 = 25;
    const MAX_DELAY: Duration = Duration::from_secs(2);

    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Retries back to back. Used by tests and in-memory stores.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }

    /// Doubling delays starting at `base_delay`. backon counts retries, so
    /// the first attempt is not part of `max_times`.
    pub(crate) fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.base_delay)
            .with_max_delay(Self::MAX_DELAY.max(self.base_delay))
            .with_factor(2.0)
            .with_max_times(self.max_attempts.saturating_sub(1) as usize)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_MAX_ATTEMPTS,
            Duration::from_millis(Self::DEFAULT_BASE_DELAY_MS),
        )
    }
}

/// Runs `work` until it succeeds, fails with a non-retryable error, or the
/// attempt budget is spent. The last error is returned unchanged.
pub async fn retry_storage<T, E, F, Fut>(
    policy: RetryPolicy,
    operation: &'static str,
    work: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let attempt = AtomicU32::new(0);

    work.retry(policy.backoff())
        .sleep(tokio::time::sleep)
        .when(|e: &E| e.is_retryable())
        .notify(|e: &E, delay: Duration| {
            let attempt = attempt.fetch_add(1, Ordering::SeqCst) + 1;
            warn!(
                operation,
                attempt,
                max_attempts = policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %e,
                "Storage conflict, retrying"
            );
        })
        .await
}
