use chrono::Utc;
use sea_orm::entity::prelude::*;
use std::str::FromStr;
use uuid::Uuid;

use crate::auth::application::domain::entities::{Account, AccountState, UserId};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    /// One of `pending`, `active`, `suspended` (checked by the table).
    pub state: String,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::verification_tokens::Entity")]
    VerificationTokens,
}

impl Related<super::verification_tokens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VerificationTokens.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        use sea_orm::ActiveValue::Set;

        if !insert {
            // Only update updated_at on UPDATE, not INSERT
            self.updated_at = Set(Utc::now().into());
        }

        Ok(self)
    }
}

impl Model {
    pub fn into_account(self) -> Result<Account, String> {
        Ok(Account {
            id: UserId::from(self.id),
            email: self.email,
            state: AccountState::from_str(&self.state)?,
            is_active: self.is_active,
            created_at: self.created_at.with_timezone(&Utc),
            updated_at: self.updated_at.with_timezone(&Utc),
        })
    }
}
