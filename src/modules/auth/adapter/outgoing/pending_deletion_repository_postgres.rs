use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseBackend, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, QueryFilter, Statement, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::application::domain::entities::{
    Account, DeletableEntity, NewPendingDeletion, PendingDeletion, UserId,
};
use crate::auth::application::ports::outgoing::{
    PendingDeletionRepository, PendingDeletionRepositoryError,
};

use super::db_error::{classify, DbFault};
use super::sea_orm_entity::pending_deletions::{
    Column as DeletionColumn, Entity as DeletionEntity, Model as DeletionModel,
};
use super::sea_orm_entity::users::Entity as UserEntity;
use super::user_row_lock::lock_user_row;

#[derive(Clone, Debug)]
pub struct PendingDeletionRepositoryPostgres {
    db: Arc<DatabaseConnection>,
}

impl PendingDeletionRepositoryPostgres {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // =====================================================
    // SQL builders
    // =====================================================

    /// One pending deletion per entity; a second request inserts nothing.
    fn schedule_stmt(id: Uuid, deletion: &NewPendingDeletion) -> Statement {
        Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            r#"
            INSERT INTO pending_deletions
                (id, entity_type, entity_id, requested_by, scheduled_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (entity_type, entity_id) DO NOTHING
            RETURNING *
            "#,
            vec![
                id.into(),
                deletion.entity_type.as_str().into(),
                deletion.entity_id.into(),
                deletion.requested_by.value().into(),
                deletion.scheduled_at.into(),
                deletion.created_at.into(),
            ],
        )
    }

    fn set_active_stmt(user_id: Uuid, is_active: bool, now: DateTime<Utc>) -> Statement {
        Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            r#"
            UPDATE users
            SET is_active = $2,
                updated_at = $3
            WHERE id = $1
            RETURNING *
            "#,
            vec![user_id.into(), is_active.into(), now.into()],
        )
    }

    /// Only deletes while the grace period is still running.
    fn cancel_stmt(user_id: Uuid, now: DateTime<Utc>) -> Statement {
        Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            r#"
            DELETE FROM pending_deletions
            WHERE entity_type = 'account'
              AND entity_id = $1
              AND scheduled_at > $2
            "#,
            vec![user_id.into(), now.into()],
        )
    }

    fn cancel_outcome_stmt(user_id: Uuid) -> Statement {
        Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM pending_deletions
                WHERE entity_type = 'account'
                  AND entity_id = $1
            ) AS is_scheduled
            "#,
            vec![user_id.into()],
        )
    }

    fn map_db_err(e: DbErr) -> PendingDeletionRepositoryError {
        match classify(&e) {
            DbFault::TransactionConflict => PendingDeletionRepositoryError::Conflict(e.to_string()),
            DbFault::ForeignKeyViolation => PendingDeletionRepositoryError::AccountNotFound,
            _ => PendingDeletionRepositoryError::DatabaseError(e.to_string()),
        }
    }

    /// Locks the account row for the rest of `txn`.
    async fn lock_account(
        txn: &DatabaseTransaction,
        user_id: Uuid,
    ) -> Result<(), PendingDeletionRepositoryError> {
        match lock_user_row(txn, user_id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(PendingDeletionRepositoryError::AccountNotFound),
            Err(e) => Err(Self::map_db_err(e)),
        }
    }

    /// Flips `is_active` inside `txn` and returns the updated account.
    async fn set_active(
        txn: &DatabaseTransaction,
        user_id: Uuid,
        is_active: bool,
        now: DateTime<Utc>,
    ) -> Result<Account, PendingDeletionRepositoryError> {
        UserEntity::find()
            .from_raw_sql(Self::set_active_stmt(user_id, is_active, now))
            .one(txn)
            .await
            .map_err(Self::map_db_err)?
            .ok_or(PendingDeletionRepositoryError::AccountNotFound)?
            .into_account()
            .map_err(PendingDeletionRepositoryError::DatabaseError)
    }

    /// Resolve why the guarded delete affected 0 rows.
    async fn resolve_cancel_failure(
        txn: &DatabaseTransaction,
        user_id: Uuid,
    ) -> PendingDeletionRepositoryError {
        match txn.query_one(Self::cancel_outcome_stmt(user_id)).await {
            Ok(Some(row)) => {
                let is_scheduled: bool = row.try_get("", "is_scheduled").unwrap_or(false);
                if is_scheduled {
                    PendingDeletionRepositoryError::GracePeriodExpired
                } else {
                    PendingDeletionRepositoryError::NotScheduled
                }
            }
            Ok(None) => PendingDeletionRepositoryError::DatabaseError(
                "Outcome query returned no rows".to_string(),
            ),
            Err(e) => Self::map_db_err(e),
        }
    }

    fn to_domain(model: DeletionModel) -> Result<PendingDeletion, PendingDeletionRepositoryError> {
        model
            .into_pending_deletion()
            .map_err(PendingDeletionRepositoryError::DatabaseError)
    }
}

#[async_trait]
impl PendingDeletionRepository for PendingDeletionRepositoryPostgres {
    async fn find_for_entity(
        &self,
        entity_type: DeletableEntity,
        entity_id: Uuid,
    ) -> Result<Option<PendingDeletion>, PendingDeletionRepositoryError> {
        DeletionEntity::find()
            .filter(DeletionColumn::EntityType.eq(entity_type.as_str()))
            .filter(DeletionColumn::EntityId.eq(entity_id))
            .one(&*self.db)
            .await
            .map_err(Self::map_db_err)?
            .map(Self::to_domain)
            .transpose()
    }

    async fn schedule_account_deletion(
        &self,
        deletion: NewPendingDeletion,
    ) -> Result<PendingDeletion, PendingDeletionRepositoryError> {
        let txn = self.db.begin().await.map_err(Self::map_db_err)?;

        if let Err(e) = Self::lock_account(&txn, deletion.entity_id).await {
            let _ = txn.rollback().await;
            return Err(e);
        }

        let inserted = match DeletionEntity::find()
            .from_raw_sql(Self::schedule_stmt(Uuid::new_v4(), &deletion))
            .one(&txn)
            .await
        {
            Ok(Some(model)) => model,
            Ok(None) => {
                let _ = txn.rollback().await;
                return Err(PendingDeletionRepositoryError::AlreadyScheduled);
            }
            Err(e) => {
                let _ = txn.rollback().await;
                return Err(Self::map_db_err(e));
            }
        };

        if let Err(e) =
            Self::set_active(&txn, deletion.entity_id, false, deletion.created_at).await
        {
            let _ = txn.rollback().await;
            return Err(e);
        }

        txn.commit().await.map_err(Self::map_db_err)?;

        Self::to_domain(inserted)
    }

    async fn cancel_account_deletion(
        &self,
        account_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Account, PendingDeletionRepositoryError> {
        let user_uuid = account_id.value();
        let txn = self.db.begin().await.map_err(Self::map_db_err)?;

        if let Err(e) = Self::lock_account(&txn, user_uuid).await {
            let _ = txn.rollback().await;
            return Err(e);
        }

        let deleted = match txn.execute(Self::cancel_stmt(user_uuid, now)).await {
            Ok(res) => res,
            Err(e) => {
                let _ = txn.rollback().await;
                return Err(Self::map_db_err(e));
            }
        };

        if deleted.rows_affected() != 1 {
            let err = Self::resolve_cancel_failure(&txn, user_uuid).await;
            let _ = txn.rollback().await;
            return Err(err);
        }

        let account = match Self::set_active(&txn, user_uuid, true, now).await {
            Ok(account) => account,
            Err(e) => {
                let _ = txn.rollback().await;
                return Err(e);
            }
        };

        txn.commit().await.map_err(Self::map_db_err)?;

        Ok(account)
    }
}
