use async_trait::async_trait;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::application::domain::entities::{Account, AccountState, UserId};
use crate::auth::application::ports::outgoing::{AccountRepository, AccountRepositoryError};

use super::db_error::{classify, DbFault};
use super::sea_orm_entity::users::{
    ActiveModel as UserActiveModel, Entity as UserEntity, Model as UserModel,
};

#[derive(Clone, Debug)]
pub struct AccountRepositoryPostgres {
    db: Arc<DatabaseConnection>,
}

impl AccountRepositoryPostgres {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    fn to_account(model: UserModel) -> Result<Account, AccountRepositoryError> {
        model
            .into_account()
            .map_err(AccountRepositoryError::DatabaseError)
    }
}

#[async_trait]
impl AccountRepository for AccountRepositoryPostgres {
    async fn create_account(&self, email: &str) -> Result<Account, AccountRepositoryError> {
        let active_user = UserActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_string()),
            state: Set(AccountState::Pending.as_str().to_string()),
            is_active: Set(true),
            created_at: NotSet,
            updated_at: NotSet,
        };

        let inserted = active_user
            .insert(&*self.db)
            .await
            .map_err(|e| match classify(&e) {
                DbFault::UniqueViolation(_) => AccountRepositoryError::AccountAlreadyExists,
                _ => AccountRepositoryError::DatabaseError(e.to_string()),
            })?;

        Self::to_account(inserted)
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<Account>, AccountRepositoryError> {
        UserEntity::find_by_id(user_id.value())
            .one(&*self.db)
            .await
            .map_err(|e| AccountRepositoryError::DatabaseError(e.to_string()))?
            .map(Self::to_account)
            .transpose()
    }
}
