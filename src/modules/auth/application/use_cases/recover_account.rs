use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::application::domain::entities::{Account, DeletableEntity, UserId};
use crate::auth::application::ports::outgoing::{
    Clock, PendingDeletionRepository, PendingDeletionRepositoryError,
};
use crate::shared::error_kind::ErrorKind;
use crate::shared::retry::{retry_storage, RetryPolicy};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecoverAccountError {
    #[error("No deletion is scheduled for this account")]
    NotScheduled,

    #[error("The recovery grace period has expired")]
    GracePeriodExpired,

    #[error("Account not found")]
    AccountNotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl RecoverAccountError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotScheduled | Self::GracePeriodExpired => ErrorKind::StateConflict,
            Self::AccountNotFound => ErrorKind::NotFound,
            Self::DatabaseError(_) => ErrorKind::Storage,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::NotScheduled => "NOT_SCHEDULED",
            Self::GracePeriodExpired => "GRACE_PERIOD_EXPIRED",
            Self::AccountNotFound => "USER_NOT_FOUND",
            Self::DatabaseError(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<PendingDeletionRepositoryError> for RecoverAccountError {
    fn from(e: PendingDeletionRepositoryError) -> Self {
        match e {
            PendingDeletionRepositoryError::NotScheduled => Self::NotScheduled,
            PendingDeletionRepositoryError::GracePeriodExpired => Self::GracePeriodExpired,
            PendingDeletionRepositoryError::AccountNotFound => Self::AccountNotFound,
            other => Self::DatabaseError(other.to_string()),
        }
    }
}

#[async_trait]
pub trait RecoverAccountUseCase: Send + Sync {
    async fn execute(&self, user_id: UserId) -> Result<Account, RecoverAccountError>;
}

#[derive(Clone)]
pub struct RecoverAccountService {
    deletions: Arc<dyn PendingDeletionRepository>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

impl RecoverAccountService {
    pub fn new(
        deletions: Arc<dyn PendingDeletionRepository>,
        clock: Arc<dyn Clock>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            deletions,
            clock,
            retry,
        }
    }
}

#[async_trait]
impl RecoverAccountUseCase for RecoverAccountService {
    async fn execute(&self, user_id: UserId) -> Result<Account, RecoverAccountError> {
        let now = self.clock.now();

        let pending = self
            .deletions
            .find_for_entity(DeletableEntity::Account, user_id.value())
            .await?
            .ok_or(RecoverAccountError::NotScheduled)?;

        if !pending.is_recoverable_at(now) {
            warn!(
                user_id = %user_id,
                scheduled_at = %pending.scheduled_at,
                "Recovery attempted after grace period"
            );
            return Err(RecoverAccountError::GracePeriodExpired);
        }

        // The delete is guarded on scheduled_at as well, so a sweep or a
        // parallel recovery between the read and the write is still caught.
        let deletions = &self.deletions;
        let account = retry_storage(self.retry, "recover_account", || {
            deletions.cancel_account_deletion(user_id, now)
        })
        .await?;

        info!(user_id = %user_id, "Account recovered");

        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::application::domain::entities::PendingDeletion;
    use crate::tests::support::port_mocks::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use mockall::predicate::eq;
    use uuid::Uuid;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
    }

    fn scheduled_for(user_id: UserId) -> PendingDeletion {
        PendingDeletion {
            id: Uuid::new_v4(),
            entity_type: DeletableEntity::Account,
            entity_id: user_id.value(),
            requested_by: user_id,
            scheduled_at: t0() + Duration::days(30),
            created_at: t0(),
        }
    }

    fn service_at(
        deletions: MockPendingDeletionRepositoryMock,
        now: DateTime<Utc>,
    ) -> RecoverAccountService {
        RecoverAccountService::new(
            Arc::new(deletions),
            Arc::new(FrozenClock(now)),
            RetryPolicy::immediate(3),
        )
    }

    #[tokio::test]
    async fn test_recover_within_grace_period() {
        let user_id = UserId::from(Uuid::new_v4());
        let now = t0() + Duration::days(10);
        let pending = scheduled_for(user_id);

        let mut deletions = MockPendingDeletionRepositoryMock::new();
        deletions
            .expect_find_for_entity()
            .with(eq(DeletableEntity::Account), eq(user_id.value()))
            .returning(move |_, _| Ok(Some(pending.clone())));
        deletions
            .expect_cancel_account_deletion()
            .with(eq(user_id), eq(now))
            .times(1)
            .returning(|id, _| Ok(pending_account(id)));

        let account = service_at(deletions, now).execute(user_id).await.unwrap();

        assert_eq!(account.id, user_id);
        assert!(account.is_active);
    }

    #[tokio::test]
    async fn test_recover_after_grace_period() {
        let user_id = UserId::from(Uuid::new_v4());
        let pending = scheduled_for(user_id);

        let mut deletions = MockPendingDeletionRepositoryMock::new();
        deletions
            .expect_find_for_entity()
            .returning(move |_, _| Ok(Some(pending.clone())));
        deletions.expect_cancel_account_deletion().never();

        let err = service_at(deletions, t0() + Duration::days(31))
            .execute(user_id)
            .await
            .unwrap_err();

        assert_eq!(err, RecoverAccountError::GracePeriodExpired);
        assert_eq!(err.code(), "GRACE_PERIOD_EXPIRED");
    }

    #[tokio::test]
    async fn test_recover_exactly_at_scheduled_time_is_too_late() {
        let user_id = UserId::from(Uuid::new_v4());
        let pending = scheduled_for(user_id);

        let mut deletions = MockPendingDeletionRepositoryMock::new();
        deletions
            .expect_find_for_entity()
            .returning(move |_, _| Ok(Some(pending.clone())));
        deletions.expect_cancel_account_deletion().never();

        let err = service_at(deletions, t0() + Duration::days(30))
            .execute(user_id)
            .await
            .unwrap_err();

        assert_eq!(err, RecoverAccountError::GracePeriodExpired);
    }

    #[tokio::test]
    async fn test_recover_without_schedule() {
        let mut deletions = MockPendingDeletionRepositoryMock::new();
        deletions.expect_find_for_entity().returning(|_, _| Ok(None));

        let err = service_at(deletions, t0())
            .execute(UserId::from(Uuid::new_v4()))
            .await
            .unwrap_err();

        assert_eq!(err, RecoverAccountError::NotScheduled);
    }

    #[tokio::test]
    async fn test_recover_race_with_sweep_is_reported_from_storage() {
        let user_id = UserId::from(Uuid::new_v4());
        let pending = scheduled_for(user_id);

        let mut deletions = MockPendingDeletionRepositoryMock::new();
        deletions
            .expect_find_for_entity()
            .returning(move |_, _| Ok(Some(pending.clone())));
        deletions
            .expect_cancel_account_deletion()
            .returning(|_, _| Err(PendingDeletionRepositoryError::NotScheduled));

        let err = service_at(deletions, t0() + Duration::days(1))
            .execute(user_id)
            .await
            .unwrap_err();

        assert_eq!(err, RecoverAccountError::NotScheduled);
    }
}
