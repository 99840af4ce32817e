use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // =====================================================
        // Create pending_deletions table
        // entity_type is "account" today; kept as a column so other
        // entity kinds can share the grace-period workflow.
        // =====================================================
        manager
            .create_table(
                Table::create()
                    .table(PendingDeletions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PendingDeletions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PendingDeletions::EntityType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PendingDeletions::EntityId).uuid().not_null())
                    .col(
                        ColumnDef::new(PendingDeletions::RequestedBy)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PendingDeletions::ScheduledAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PendingDeletions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    // FK → users (requester)
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pending_deletions_requested_by")
                            .from(PendingDeletions::Table, PendingDeletions::RequestedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // =====================================================
        // Indexes
        // =====================================================

        // One pending deletion per entity
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE UNIQUE INDEX uq_pending_deletions_entity
                ON pending_deletions (entity_type, entity_id);
                "#,
            )
            .await?;

        // Purge sweep scans by due date
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE INDEX idx_pending_deletions_scheduled_at
                ON pending_deletions (scheduled_at);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DROP INDEX IF EXISTS uq_pending_deletions_entity;
                DROP INDEX IF EXISTS idx_pending_deletions_scheduled_at;
                "#,
            )
            .await?;

        manager
            .drop_table(Table::drop().table(PendingDeletions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PendingDeletions {
    Table,
    Id,
    EntityType,
    EntityId,
    RequestedBy,
    ScheduledAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
