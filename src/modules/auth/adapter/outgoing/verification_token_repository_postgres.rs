use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseBackend, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, FromQueryResult, QueryFilter, QueryOrder, Set,
    Statement, TransactionTrait,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::application::domain::entities::{NewVerificationToken, UserId, VerificationToken};
use crate::auth::application::ports::outgoing::{
    VerificationTokenRepository, VerificationTokenRepositoryError,
};

use super::db_error::{classify, DbFault};
use super::sea_orm_entity::verification_tokens::{
    ActiveModel as TokenActiveModel, Column as TokenColumn, Entity as TokenEntity,
};
use super::user_row_lock::lock_user_row;

const LIVE_TOKEN_INDEX: &str = "uq_verification_tokens_live";

#[derive(Clone, Debug)]
pub struct VerificationTokenRepositoryPostgres {
    db: Arc<DatabaseConnection>,
}

impl VerificationTokenRepositoryPostgres {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // =====================================================
    // SQL builders
    // =====================================================

    /// Consumes the token only while it is still unused and unexpired.
    fn consume_stmt(token_id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> Statement {
        Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            r#"
            UPDATE verification_tokens
            SET used = true
            WHERE id = $1
              AND user_id = $2
              AND used = false
              AND expires_at >= $3
            "#,
            vec![token_id.into(), user_id.into(), now.into()],
        )
    }

    /// Activates the account. `is_active` stays false while a deletion is
    /// pending for it; the subquery is only current because the user row
    /// was locked earlier in the same transaction.
    fn activate_stmt(user_id: Uuid, now: DateTime<Utc>) -> Statement {
        Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            r#"
            UPDATE users
            SET state = 'active',
                is_active = NOT EXISTS (
                    SELECT 1
                    FROM pending_deletions pd
                    WHERE pd.entity_type = 'account'
                      AND pd.entity_id = $1
                ),
                updated_at = $2
            WHERE id = $1
            "#,
            vec![user_id.into(), now.into()],
        )
    }

    fn consume_outcome_stmt(token_id: Uuid, now: DateTime<Utc>) -> Statement {
        Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            r#"
            SELECT
              EXISTS (
                SELECT 1 FROM verification_tokens WHERE id = $1
              ) AS token_exists,
              EXISTS (
                SELECT 1 FROM verification_tokens WHERE id = $1 AND expires_at < $2
              ) AS token_expired,
              EXISTS (
                SELECT 1 FROM verification_tokens WHERE id = $1 AND used = true
              ) AS token_used
            "#,
            vec![token_id.into(), now.into()],
        )
    }

    fn supersede_stmt(user_id: Uuid) -> Statement {
        Statement::from_sql_and_values(
            DatabaseBackend::Postgres,
            r#"
            UPDATE verification_tokens
            SET used = true
            WHERE user_id = $1
              AND used = false
            RETURNING id
            "#,
            vec![user_id.into()],
        )
    }

    fn map_db_err(e: DbErr) -> VerificationTokenRepositoryError {
        match classify(&e) {
            DbFault::TransactionConflict => VerificationTokenRepositoryError::Conflict(e.to_string()),
            _ => VerificationTokenRepositoryError::DatabaseError(e.to_string()),
        }
    }

    fn map_insert_err(e: DbErr) -> VerificationTokenRepositoryError {
        match classify(&e) {
            DbFault::UniqueViolation(msg) if msg.contains(LIVE_TOKEN_INDEX) => {
                VerificationTokenRepositoryError::TokenAlreadyIssued
            }
            DbFault::ForeignKeyViolation => VerificationTokenRepositoryError::AccountNotFound,
            DbFault::TransactionConflict => VerificationTokenRepositoryError::Conflict(e.to_string()),
            _ => VerificationTokenRepositoryError::DatabaseError(e.to_string()),
        }
    }

    fn active_model(token: NewVerificationToken) -> TokenActiveModel {
        TokenActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(token.user_id.value()),
            token_hash: Set(token.token_hash),
            created_at: Set(token.created_at.fixed_offset()),
            expires_at: Set(token.expires_at.fixed_offset()),
            used: Set(false),
            resend_count: Set(i32::try_from(token.resend_count).unwrap_or(i32::MAX)),
            last_resend_at: Set(token.last_resend_at.map(|t| t.fixed_offset())),
        }
    }

    /// Resolve why the guarded consume affected 0 rows.
    /// Expiry wins over `used`, matching what the caller reports.
    async fn resolve_consume_failure(
        txn: &DatabaseTransaction,
        token_id: Uuid,
        now: DateTime<Utc>,
    ) -> VerificationTokenRepositoryError {
        let row = match txn.query_one(Self::consume_outcome_stmt(token_id, now)).await {
            Ok(Some(row)) => row,
            Ok(None) => {
                return VerificationTokenRepositoryError::DatabaseError(
                    "Outcome query returned no rows".to_string(),
                )
            }
            Err(e) => return Self::map_db_err(e),
        };

        let token_exists: bool = row.try_get("", "token_exists").unwrap_or(false);
        let token_expired: bool = row.try_get("", "token_expired").unwrap_or(false);
        let token_used: bool = row.try_get("", "token_used").unwrap_or(false);

        if !token_exists {
            VerificationTokenRepositoryError::TokenNotFound
        } else if token_expired {
            VerificationTokenRepositoryError::TokenExpired
        } else if token_used {
            VerificationTokenRepositoryError::TokenAlreadyUsed
        } else {
            // Row exists, unexpired and unused, but owned by someone else.
            VerificationTokenRepositoryError::TokenNotFound
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct IdRow {
    id: Uuid,
}

#[async_trait]
impl VerificationTokenRepository for VerificationTokenRepositoryPostgres {
    async fn insert_token(
        &self,
        token: NewVerificationToken,
    ) -> Result<VerificationToken, VerificationTokenRepositoryError> {
        let inserted = Self::active_model(token)
            .insert(&*self.db)
            .await
            .map_err(Self::map_insert_err)?;

        Ok(inserted.into())
    }

    async fn find_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<VerificationToken>, VerificationTokenRepositoryError> {
        let found = TokenEntity::find()
            .filter(TokenColumn::TokenHash.eq(token_hash))
            .one(&*self.db)
            .await
            .map_err(Self::map_db_err)?;

        Ok(found.map(Into::into))
    }

    async fn find_latest_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<VerificationToken>, VerificationTokenRepositoryError> {
        let found = TokenEntity::find()
            .filter(TokenColumn::UserId.eq(user_id.value()))
            .order_by_desc(TokenColumn::ResendCount)
            .order_by_desc(TokenColumn::CreatedAt)
            .one(&*self.db)
            .await
            .map_err(Self::map_db_err)?;

        Ok(found.map(Into::into))
    }

    async fn consume_and_activate(
        &self,
        token_id: Uuid,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<(), VerificationTokenRepositoryError> {
        let user_uuid = user_id.value();
        let txn = self.db.begin().await.map_err(Self::map_db_err)?;

        match lock_user_row(&txn, user_uuid).await {
            Ok(true) => {}
            Ok(false) => {
                let _ = txn.rollback().await;
                return Err(VerificationTokenRepositoryError::AccountNotFound);
            }
            Err(e) => {
                let _ = txn.rollback().await;
                return Err(Self::map_db_err(e));
            }
        }

        let consumed = match txn
            .execute(Self::consume_stmt(token_id, user_uuid, now))
            .await
        {
            Ok(res) => res,
            Err(e) => {
                let _ = txn.rollback().await;
                return Err(Self::map_db_err(e));
            }
        };

        if consumed.rows_affected() != 1 {
            let err = Self::resolve_consume_failure(&txn, token_id, now).await;
            let _ = txn.rollback().await;
            return Err(err);
        }

        let activated = match txn.execute(Self::activate_stmt(user_uuid, now)).await {
            Ok(res) => res,
            Err(e) => {
                let _ = txn.rollback().await;
                return Err(Self::map_db_err(e));
            }
        };

        if activated.rows_affected() != 1 {
            let _ = txn.rollback().await;
            return Err(VerificationTokenRepositoryError::AccountNotFound);
        }

        txn.commit().await.map_err(Self::map_db_err)
    }

    async fn supersede_and_insert(
        &self,
        expected_live: Option<Uuid>,
        token: NewVerificationToken,
    ) -> Result<VerificationToken, VerificationTokenRepositoryError> {
        let txn = self.db.begin().await.map_err(Self::map_db_err)?;

        let superseded = match IdRow::find_by_statement(Self::supersede_stmt(token.user_id.value()))
            .all(&txn)
            .await
        {
            Ok(rows) => rows.into_iter().map(|r| r.id).collect::<Vec<_>>(),
            Err(e) => {
                let _ = txn.rollback().await;
                return Err(Self::map_db_err(e));
            }
        };

        let expected: Vec<Uuid> = expected_live.into_iter().collect();
        if superseded != expected {
            let _ = txn.rollback().await;
            return Err(VerificationTokenRepositoryError::Conflict(format!(
                "expected live token {:?}, found {:?}",
                expected_live, superseded
            )));
        }

        let inserted = match Self::active_model(token).insert(&txn).await {
            Ok(model) => model,
            Err(e) => {
                let _ = txn.rollback().await;
                return Err(match Self::map_insert_err(e) {
                    VerificationTokenRepositoryError::TokenAlreadyIssued => {
                        VerificationTokenRepositoryError::Conflict(
                            "live token inserted concurrently".to_string(),
                        )
                    }
                    other => other,
                });
            }
        };

        txn.commit().await.map_err(Self::map_db_err)?;

        Ok(inserted.into())
    }
}
