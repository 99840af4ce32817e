use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // =====================================================
        // Create verification_tokens table
        // Rows are never deleted; they are kept for audit.
        // =====================================================
        manager
            .create_table(
                Table::create()
                    .table(VerificationTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VerificationTokens::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VerificationTokens::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(VerificationTokens::TokenHash)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(VerificationTokens::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(VerificationTokens::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VerificationTokens::Used)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(VerificationTokens::ResendCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(VerificationTokens::LastResendAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    // FK → users
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_verification_tokens_user_id")
                            .from(VerificationTokens::Table, VerificationTokens::UserId)
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

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                ALTER TABLE verification_tokens
                ADD CONSTRAINT chk_verification_tokens_resend_count
                CHECK (resend_count >= 0);
                "#,
            )
            .await?;

        // At most one live (unused) token per user.
        // Concurrent issue/resend transactions collide here instead of
        // both committing a live token.
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE UNIQUE INDEX uq_verification_tokens_live
                ON verification_tokens (user_id)
                WHERE used = false;
                "#,
            )
            .await?;

        // Latest token per user (resend bookkeeping)
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE INDEX idx_verification_tokens_user_latest
                ON verification_tokens (user_id, resend_count DESC, created_at DESC);
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
                DROP INDEX IF EXISTS uq_verification_tokens_live;
                DROP INDEX IF EXISTS idx_verification_tokens_user_latest;
                "#,
            )
            .await?;

        manager
            .drop_table(Table::drop().table(VerificationTokens::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum VerificationTokens {
    Table,
    Id,
    UserId,
    TokenHash,
    CreatedAt,
    ExpiresAt,
    Used,
    ResendCount,
    LastResendAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
