use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use crate::auth::application::domain::entities::{DeletableEntity, NewPendingDeletion, UserId};
use crate::auth::application::domain::policies::DeletionPolicy;
use crate::auth::application::ports::outgoing::{
    AccountRepository, Clock, PendingDeletionRepository, PendingDeletionRepositoryError,
};
use crate::shared::error_kind::ErrorKind;
use crate::shared::retry::{retry_storage, RetryPolicy};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SoftDeleteUserError {
    #[error("Account not found")]
    AccountNotFound,

    #[error("Account deletion is already scheduled")]
    DeletionAlreadyScheduled,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl SoftDeleteUserError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AccountNotFound => ErrorKind::NotFound,
            Self::DeletionAlreadyScheduled => ErrorKind::StateConflict,
            Self::DatabaseError(_) => ErrorKind::Storage,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::AccountNotFound => "USER_NOT_FOUND",
            Self::DeletionAlreadyScheduled => "DELETION_ALREADY_SCHEDULED",
            Self::DatabaseError(_) => "INTERNAL_ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledDeletion {
    pub scheduled_at: DateTime<Utc>,
    pub days_remaining: i64,
}

#[async_trait]
pub trait SoftDeleteUserUseCase: Send + Sync {
    async fn execute(&self, user_id: UserId) -> Result<ScheduledDeletion, SoftDeleteUserError>;
}

/// Schedules the caller's account for deletion after the grace period.
/// Stored assets are left alone; the purge sweep owns them.
#[derive(Clone)]
pub struct SoftDeleteUserService {
    accounts: Arc<dyn AccountRepository>,
    deletions: Arc<dyn PendingDeletionRepository>,
    clock: Arc<dyn Clock>,
    policy: DeletionPolicy,
    retry: RetryPolicy,
}

impl SoftDeleteUserService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        deletions: Arc<dyn PendingDeletionRepository>,
        clock: Arc<dyn Clock>,
        policy: DeletionPolicy,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            accounts,
            deletions,
            clock,
            policy,
            retry,
        }
    }
}

#[async_trait]
impl SoftDeleteUserUseCase for SoftDeleteUserService {
    async fn execute(&self, user_id: UserId) -> Result<ScheduledDeletion, SoftDeleteUserError> {
        self.accounts
            .find_by_id(user_id)
            .await
            .map_err(|e| SoftDeleteUserError::DatabaseError(e.to_string()))?
            .ok_or(SoftDeleteUserError::AccountNotFound)?;

        let now = self.clock.now();
        let request = NewPendingDeletion {
            entity_type: DeletableEntity::Account,
            entity_id: user_id.value(),
            requested_by: user_id,
            scheduled_at: self.policy.schedule_from(now),
            created_at: now,
        };

        let deletions = &self.deletions;
        let pending = retry_storage(self.retry, "soft_delete_user", || {
            deletions.schedule_account_deletion(request.clone())
        })
        .await
        .map_err(|e| match e {
            PendingDeletionRepositoryError::AlreadyScheduled => {
                SoftDeleteUserError::DeletionAlreadyScheduled
            }
            PendingDeletionRepositoryError::AccountNotFound => SoftDeleteUserError::AccountNotFound,
            other => SoftDeleteUserError::DatabaseError(other.to_string()),
        })?;

        info!(
            user_id = %user_id,
            scheduled_at = %pending.scheduled_at,
            "Account scheduled for deletion"
        );

        Ok(ScheduledDeletion {
            scheduled_at: pending.scheduled_at,
            days_remaining: self.policy.days_remaining(pending.scheduled_at, now),
        })
    }
}
