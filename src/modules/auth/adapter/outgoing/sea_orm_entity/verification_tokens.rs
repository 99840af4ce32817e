use chrono::Utc;
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::auth::application::domain::entities::{UserId, VerificationToken};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "verification_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    #[sea_orm(unique)]
    pub token_hash: String,
    pub created_at: DateTimeWithTimeZone,
    pub expires_at: DateTimeWithTimeZone,
    pub used: bool,
    pub resend_count: i32,
    pub last_resend_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for VerificationToken {
    fn from(model: Model) -> Self {
        VerificationToken {
            id: model.id,
            user_id: UserId::from(model.user_id),
            token_hash: model.token_hash,
            created_at: model.created_at.with_timezone(&Utc),
            expires_at: model.expires_at.with_timezone(&Utc),
            used: model.used,
            resend_count: u32::try_from(model.resend_count).unwrap_or(0),
            last_resend_at: model.last_resend_at.map(|t| t.with_timezone(&Utc)),
        }
    }
}
