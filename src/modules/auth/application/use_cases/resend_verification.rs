use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::application::domain::entities::{
    Account, IssuedToken, NewVerificationToken, UserId,
};
use crate::auth::application::domain::policies::{
    ResendDecision, ResendDenial, ResendPolicy, TokenPolicy,
};
use crate::auth::application::ports::outgoing::{
    AccountRepository, Clock, VerificationTokenRepository, VerificationTokenRepositoryError,
};
use crate::auth::application::services::hash::{generate_token, hash_token};
use crate::email::application::ports::outgoing::UserEmailNotifier;
use crate::shared::error_kind::ErrorKind;
use crate::shared::retry::{retry_storage, RetryPolicy, Retryable};

use super::verification_mail::dispatch_verification_email;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResendVerificationError {
    #[error("Account not found")]
    AccountNotFound,

    #[error("Account is already verified")]
    AlreadyVerified,

    #[error("Maximum of {max_attempts} resend attempts reached")]
    ResendLimitExceeded { max_attempts: u32 },

    #[error("Please wait {retry_after_secs} seconds before requesting another email")]
    ResendCooldownActive { retry_after_secs: i64 },

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl ResendVerificationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AccountNotFound => ErrorKind::NotFound,
            Self::AlreadyVerified => ErrorKind::StateConflict,
            Self::ResendLimitExceeded { .. } | Self::ResendCooldownActive { .. } => {
                ErrorKind::RateLimit
            }
            Self::DatabaseError(_) => ErrorKind::Storage,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::AccountNotFound => "USER_NOT_FOUND",
            Self::AlreadyVerified => "ALREADY_VERIFIED",
            Self::ResendLimitExceeded { .. } => "RESEND_LIMIT_EXCEEDED",
            Self::ResendCooldownActive { .. } => "RESEND_COOLDOWN_ACTIVE",
            Self::DatabaseError(_) => "INTERNAL_ERROR",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResendOutcome {
    pub token: IssuedToken,
    pub remaining_attempts: u32,
}

/// One read-decide-write pass either settles the request or hits a
/// concurrent writer and must be run again from the read.
#[derive(Debug)]
enum AttemptError {
    Settled(ResendVerificationError),
    Conflict(String),
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::Settled(e) => write!(f, "{}", e),
            AttemptError::Conflict(msg) => write!(f, "Concurrent resend: {}", msg),
        }
    }
}

impl Retryable for AttemptError {
    fn is_retryable(&self) -> bool {
        matches!(self, AttemptError::Conflict(_))
    }
}

impl From<ResendVerificationError> for AttemptError {
    fn from(e: ResendVerificationError) -> Self {
        AttemptError::Settled(e)
    }
}

#[async_trait]
pub trait ResendVerificationUseCase: Send + Sync {
    async fn execute(&self, user_id: UserId) -> Result<ResendOutcome, ResendVerificationError>;
}

#[derive(Clone)]
pub struct ResendVerificationService {
    accounts: Arc<dyn AccountRepository>,
    tokens: Arc<dyn VerificationTokenRepository>,
    notifier: Arc<dyn UserEmailNotifier>,
    clock: Arc<dyn Clock>,
    token_policy: TokenPolicy,
    resend_policy: ResendPolicy,
    retry: RetryPolicy,
}

impl ResendVerificationService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        tokens: Arc<dyn VerificationTokenRepository>,
        notifier: Arc<dyn UserEmailNotifier>,
        clock: Arc<dyn Clock>,
        token_policy: TokenPolicy,
        resend_policy: ResendPolicy,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            accounts,
            tokens,
            notifier,
            clock,
            token_policy,
            resend_policy,
            retry,
        }
    }

    async fn attempt(&self, user_id: UserId) -> Result<(Account, ResendOutcome), AttemptError> {
        let account = self
            .accounts
            .find_by_id(user_id)
            .await
            .map_err(|e| ResendVerificationError::DatabaseError(e.to_string()))?
            .ok_or(ResendVerificationError::AccountNotFound)?;

        if account.is_verified() {
            return Err(ResendVerificationError::AlreadyVerified.into());
        }

        let latest = self
            .tokens
            .find_latest_for_user(user_id)
            .await
            .map_err(|e| ResendVerificationError::DatabaseError(e.to_string()))?;

        let (resend_count, last_resend_at) = latest
            .as_ref()
            .map(|t| (t.resend_count, t.last_resend_at))
            .unwrap_or((0, None));

        let now = self.clock.now();
        if let ResendDecision::Deny(denial) =
            self.resend_policy
                .evaluate(resend_count, last_resend_at, now)
        {
            let err = match denial {
                ResendDenial::LimitExceeded { max_attempts } => {
                    ResendVerificationError::ResendLimitExceeded { max_attempts }
                }
                ResendDenial::CooldownActive { retry_after } => {
                    ResendVerificationError::ResendCooldownActive {
                        retry_after_secs: ceil_secs(retry_after),
                    }
                }
            };
            return Err(err.into());
        }

        let expected_live = latest.as_ref().filter(|t| !t.used).map(|t| t.id);
        let next_count = resend_count + 1;
        let plaintext = generate_token(TokenPolicy::TOKEN_LENGTH);

        let stored = self
            .tokens
            .supersede_and_insert(
                expected_live,
                NewVerificationToken {
                    user_id,
                    token_hash: hash_token(plaintext.expose()),
                    created_at: now,
                    expires_at: self.token_policy.expires_at(now),
                    resend_count: next_count,
                    last_resend_at: Some(now),
                },
            )
            .await
            .map_err(|e| match e {
                VerificationTokenRepositoryError::Conflict(msg) => AttemptError::Conflict(msg),
                VerificationTokenRepositoryError::TokenAlreadyIssued => {
                    AttemptError::Conflict("live token inserted concurrently".to_string())
                }
                VerificationTokenRepositoryError::AccountNotFound => {
                    ResendVerificationError::AccountNotFound.into()
                }
                other => ResendVerificationError::DatabaseError(other.to_string()).into(),
            })?;

        let outcome = ResendOutcome {
            token: IssuedToken {
                plaintext,
                expires_at: stored.expires_at,
                resend_count: stored.resend_count,
            },
            remaining_attempts: self.resend_policy.remaining_attempts(stored.resend_count),
        };

        Ok((account, outcome))
    }
}

fn ceil_secs(d: chrono::Duration) -> i64 {
    let ms = d.num_milliseconds();
    ((ms + 999) / 1000).max(1)
}

#[async_trait]
impl ResendVerificationUseCase for ResendVerificationService {
    async fn execute(&self, user_id: UserId) -> Result<ResendOutcome, ResendVerificationError> {
        let result = retry_storage(self.retry, "resend_verification", || self.attempt(user_id)).await;

        let (account, outcome) = match result {
            Ok(done) => done,
            Err(AttemptError::Settled(e)) => {
                if e.kind() == ErrorKind::RateLimit {
                    info!(user_id = %user_id, code = e.code(), "Resend denied by policy");
                }
                return Err(e);
            }
            Err(AttemptError::Conflict(msg)) => {
                warn!(user_id = %user_id, error = %msg, "Resend retries exhausted");
                return Err(ResendVerificationError::DatabaseError(msg));
            }
        };

        info!(
            user_id = %user_id,
            resend_count = outcome.token.resend_count,
            remaining_attempts = outcome.remaining_attempts,
            "Verification token re-issued"
        );

        dispatch_verification_email(self.notifier.as_ref(), &account, &outcome.token).await;

        Ok(outcome)
    }
}
