use chrono::Utc;
use sea_orm::entity::prelude::*;
use std::str::FromStr;
use uuid::Uuid;

use crate::auth::application::domain::entities::{DeletableEntity, PendingDeletion, UserId};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "pending_deletions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub requested_by: Uuid,
    pub scheduled_at: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_pending_deletion(self) -> Result<PendingDeletion, String> {
        Ok(PendingDeletion {
            id: self.id,
            entity_type: DeletableEntity::from_str(&self.entity_type)?,
            entity_id: self.entity_id,
            requested_by: UserId::from(self.requested_by),
            scheduled_at: self.scheduled_at.with_timezone(&Utc),
            created_at: self.created_at.with_timezone(&Utc),
        })
    }
}
