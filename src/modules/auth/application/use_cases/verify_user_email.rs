use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::application::domain::entities::UserId;
use crate::auth::application::ports::outgoing::{
    Clock, VerificationTokenRepository, VerificationTokenRepositoryError,
};
use crate::auth::application::services::hash::hash_token;
use crate::shared::error_kind::ErrorKind;
use crate::shared::retry::{retry_storage, RetryPolicy};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VerifyUserEmailError {
    #[error("Verification token is required")]
    MissingToken,

    #[error("Verification token not found")]
    TokenNotFound,

    #[error("Verification token has expired")]
    TokenExpired,

    #[error("Verification token has already been used")]
    TokenAlreadyUsed,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl VerifyUserEmailError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingToken => ErrorKind::Validation,
            Self::TokenNotFound | Self::AccountNotFound => ErrorKind::NotFound,
            Self::TokenExpired | Self::TokenAlreadyUsed => ErrorKind::StateConflict,
            Self::DatabaseError(_) => ErrorKind::Storage,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingToken => "MISSING_TOKEN",
            Self::TokenNotFound => "TOKEN_NOT_FOUND",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenAlreadyUsed => "TOKEN_ALREADY_USED",
            Self::AccountNotFound => "USER_NOT_FOUND",
            Self::DatabaseError(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<VerificationTokenRepositoryError> for VerifyUserEmailError {
    fn from(e: VerificationTokenRepositoryError) -> Self {
        match e {
            VerificationTokenRepositoryError::TokenNotFound => Self::TokenNotFound,
            VerificationTokenRepositoryError::TokenExpired => Self::TokenExpired,
            VerificationTokenRepositoryError::TokenAlreadyUsed => Self::TokenAlreadyUsed,
            VerificationTokenRepositoryError::AccountNotFound => Self::AccountNotFound,
            other => Self::DatabaseError(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedAccount {
    pub user_id: UserId,
}

#[async_trait]
pub trait VerifyUserEmailUseCase: Send + Sync {
    async fn execute(&self, token: &str) -> Result<VerifiedAccount, VerifyUserEmailError>;
}

#[derive(Clone)]
pub struct VerifyUserEmailService {
    tokens: Arc<dyn VerificationTokenRepository>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

impl VerifyUserEmailService {
    pub fn new(
        tokens: Arc<dyn VerificationTokenRepository>,
        clock: Arc<dyn Clock>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            tokens,
            clock,
            retry,
        }
    }
}

#[async_trait]
impl VerifyUserEmailUseCase for VerifyUserEmailService {
    async fn execute(&self, token: &str) -> Result<VerifiedAccount, VerifyUserEmailError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(VerifyUserEmailError::MissingToken);
        }

        let stored = self
            .tokens
            .find_by_hash(&hash_token(token))
            .await?
            .ok_or(VerifyUserEmailError::TokenNotFound)?;

        let now = self.clock.now();

        // Expiry first: an expired token is reported as expired even if used.
        if stored.is_expired_at(now) {
            warn!(user_id = %stored.user_id, "Expired verification token presented");
            return Err(VerifyUserEmailError::TokenExpired);
        }
        if stored.used {
            warn!(user_id = %stored.user_id, "Used verification token presented");
            return Err(VerifyUserEmailError::TokenAlreadyUsed);
        }

        let tokens = &self.tokens;
        retry_storage(self.retry, "verify_user_email", || {
            tokens.consume_and_activate(stored.id, stored.user_id, now)
        })
        .await?;

        info!(user_id = %stored.user_id, "Email verified");

        Ok(VerifiedAccount {
            user_id: stored.user_id,
        })
    }
}
