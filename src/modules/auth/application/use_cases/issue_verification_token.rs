use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::auth::application::domain::entities::{IssuedToken, NewVerificationToken, UserId};
use crate::auth::application::domain::policies::TokenPolicy;
use crate::auth::application::ports::outgoing::{
    AccountRepository, Clock, VerificationTokenRepository, VerificationTokenRepositoryError,
};
use crate::auth::application::services::hash::{generate_token, hash_token};
use crate::email::application::ports::outgoing::UserEmailNotifier;
use crate::shared::error_kind::ErrorKind;
use crate::shared::retry::{retry_storage, RetryPolicy};

use super::verification_mail::dispatch_verification_email;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IssueVerificationTokenError {
    #[error("Account not found")]
    AccountNotFound,

    #[error("Account is already verified")]
    AlreadyVerified,

    #[error("A verification token is already outstanding")]
    TokenAlreadyIssued,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl IssueVerificationTokenError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AccountNotFound => ErrorKind::NotFound,
            Self::AlreadyVerified | Self::TokenAlreadyIssued => ErrorKind::StateConflict,
            Self::DatabaseError(_) => ErrorKind::Storage,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::AccountNotFound => "USER_NOT_FOUND",
            Self::AlreadyVerified => "ALREADY_VERIFIED",
            Self::TokenAlreadyIssued => "TOKEN_ALREADY_ISSUED",
            Self::DatabaseError(_) => "INTERNAL_ERROR",
        }
    }
}

#[async_trait]
pub trait IssueVerificationTokenUseCase: Send + Sync {
    async fn execute(&self, user_id: UserId) -> Result<IssuedToken, IssueVerificationTokenError>;
}

#[derive(Clone)]
pub struct IssueVerificationTokenService {
    accounts: Arc<dyn AccountRepository>,
    tokens: Arc<dyn VerificationTokenRepository>,
    notifier: Arc<dyn UserEmailNotifier>,
    clock: Arc<dyn Clock>,
    policy: TokenPolicy,
    retry: RetryPolicy,
}

impl IssueVerificationTokenService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        tokens: Arc<dyn VerificationTokenRepository>,
        notifier: Arc<dyn UserEmailNotifier>,
        clock: Arc<dyn Clock>,
        policy: TokenPolicy,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            accounts,
            tokens,
            notifier,
            clock,
            policy,
            retry,
        }
    }
}

#[async_trait]
impl IssueVerificationTokenUseCase for IssueVerificationTokenService {
    async fn execute(&self, user_id: UserId) -> Result<IssuedToken, IssueVerificationTokenError> {
        let account = self
            .accounts
            .find_by_id(user_id)
            .await
            .map_err(|e| IssueVerificationTokenError::DatabaseError(e.to_string()))?
            .ok_or(IssueVerificationTokenError::AccountNotFound)?;

        if account.is_verified() {
            return Err(IssueVerificationTokenError::AlreadyVerified);
        }

        let now = self.clock.now();
        let plaintext = generate_token(TokenPolicy::TOKEN_LENGTH);
        let expires_at = self.policy.expires_at(now);

        let new_token = NewVerificationToken {
            user_id,
            token_hash: hash_token(plaintext.expose()),
            created_at: now,
            expires_at,
            resend_count: 0,
            last_resend_at: None,
        };

        let tokens = &self.tokens;
        let stored = retry_storage(self.retry, "issue_verification_token", || {
            tokens.insert_token(new_token.clone())
        })
        .await
        .map_err(|e| match e {
            VerificationTokenRepositoryError::TokenAlreadyIssued => {
                IssueVerificationTokenError::TokenAlreadyIssued
            }
            VerificationTokenRepositoryError::AccountNotFound => {
                IssueVerificationTokenError::AccountNotFound
            }
            other => IssueVerificationTokenError::DatabaseError(other.to_string()),
        })?;

        info!(
            user_id = %user_id,
            expires_at = %stored.expires_at,
            "Verification token issued"
        );

        let issued = IssuedToken {
            plaintext,
            expires_at: stored.expires_at,
            resend_count: stored.resend_count,
        };

        dispatch_verification_email(self.notifier.as_ref(), &account, &issued).await;

        Ok(issued)
    }
}
