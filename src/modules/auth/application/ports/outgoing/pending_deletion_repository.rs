use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::auth::application::domain::entities::{
    Account, DeletableEntity, NewPendingDeletion, PendingDeletion, UserId,
};
use crate::shared::retry::Retryable;

#[async_trait]
pub trait PendingDeletionRepository: Send + Sync {
    async fn find_for_entity(
        &self,
        entity_type: DeletableEntity,
        entity_id: uuid::Uuid,
    ) -> Result<Option<PendingDeletion>, PendingDeletionRepositoryError>;

    /// Records the pending deletion and deactivates the account atomically.
    async fn schedule_account_deletion(
        &self,
        deletion: NewPendingDeletion,
    ) -> Result<PendingDeletion, PendingDeletionRepositoryError>;

    /// Removes the pending deletion and reactivates the account atomically,
    /// provided `now` is still before the scheduled time.
    async fn cancel_account_deletion(
        &self,
        account_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Account, PendingDeletionRepositoryError>;
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PendingDeletionRepositoryError {
    #[error("Deletion already scheduled")]
    AlreadyScheduled,

    #[error("No deletion scheduled")]
    NotScheduled,

    #[error("Grace period expired")]
    GracePeriodExpired,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Concurrent modification: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl Retryable for PendingDeletionRepositoryError {
    fn is_retryable(&self) -> bool {
        matches!(self, PendingDeletionRepositoryError::Conflict(_))
    }
}
