use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::email::application::ports::outgoing::{
    UserEmailNotificationError, UserEmailNotifier, VerificationEmail,
};

/// Delivers through the wrapped notifier on a spawned task so callers never
/// wait on SMTP. Failed deliveries are retried with exponential backoff.
#[derive(Clone)]
pub struct BackgroundNotifier {
    inner: Arc<dyn UserEmailNotifier>,
    max_attempts: u32,
    base_delay: Duration,
}

impl BackgroundNotifier {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    pub fn new(inner: Arc<dyn UserEmailNotifier>) -> Self {
        Self {
            inner,
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_secs(1),
        }
    }

    /// Delay before retry `n` is `base_delay * 2^n`.
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    fn backoff(max_attempts: u32, base_delay: Duration) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(base_delay * 2)
            .with_factor(2.0)
            .with_max_times(max_attempts.saturating_sub(1) as usize)
    }

    async fn deliver(
        inner: Arc<dyn UserEmailNotifier>,
        email: VerificationEmail,
        max_attempts: u32,
        base_delay: Duration,
    ) {
        let attempt = AtomicU32::new(0);

        let result = (|| inner.send_verification_email(email.clone()))
            .retry(Self::backoff(max_attempts, base_delay))
            .sleep(tokio::time::sleep)
            .notify(|e: &UserEmailNotificationError, delay: Duration| {
                let attempt = attempt.fetch_add(1, Ordering::SeqCst) + 1;
                tracing::warn!(
                    user_id = %email.user_id,
                    attempt,
                    max_attempts,
                    backoff_ms = delay.as_millis() as u64,
                    error = %e,
                    "Verification email attempt failed, retrying"
                );
            })
            .await;

        if let Err(e) = result {
            tracing::error!(
                user_id = %email.user_id,
                max_attempts,
                error = %e,
                "All verification email attempts failed"
            );
        }
    }
}

#[async_trait]
impl UserEmailNotifier for BackgroundNotifier {
    async fn send_verification_email(
        &self,
        email: VerificationEmail,
    ) -> Result<(), UserEmailNotificationError> {
        tokio::spawn(Self::deliver(
            Arc::clone(&self.inner),
            email,
            self.max_attempts,
            self.base_delay,
        ));
        Ok(())
    }
}
