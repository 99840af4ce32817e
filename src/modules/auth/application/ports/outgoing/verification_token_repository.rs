use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::application::domain::entities::{NewVerificationToken, UserId, VerificationToken};
use crate::shared::retry::Retryable;

#[async_trait]
pub trait VerificationTokenRepository: Send + Sync {
    /// Inserts the first live token for a user.
    /// Fails with `TokenAlreadyIssued` when an unused token already exists.
    async fn insert_token(
        &self,
        token: NewVerificationToken,
    ) -> Result<VerificationToken, VerificationTokenRepositoryError>;

    async fn find_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<VerificationToken>, VerificationTokenRepositoryError>;

    /// Most recent token for the user (highest resend count, newest first).
    async fn find_latest_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<VerificationToken>, VerificationTokenRepositoryError>;

    /// Marks the token used and flips the account to `active` in one
    /// transaction. The token must still be unused and unexpired at `now`.
    async fn consume_and_activate(
        &self,
        token_id: Uuid,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<(), VerificationTokenRepositoryError>;

    /// Marks every unused token of the user as used and inserts `token`, in
    /// one transaction. `expected_live` is the id of the unused token the
    /// caller based its decision on; any other live set is a `Conflict`.
    async fn supersede_and_insert(
        &self,
        expected_live: Option<Uuid>,
        token: NewVerificationToken,
    ) -> Result<VerificationToken, VerificationTokenRepositoryError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VerificationTokenRepositoryError {
    #[error("A live verification token already exists")]
    TokenAlreadyIssued,

    #[error("Verification token not found")]
    TokenNotFound,

    #[error("Verification token already used")]
    TokenAlreadyUsed,

    #[error("Verification token expired")]
    TokenExpired,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Concurrent modification: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl Retryable for VerificationTokenRepositoryError {
    fn is_retryable(&self) -> bool {
        matches!(self, VerificationTokenRepositoryError::Conflict(_))
    }
}
