//! Create user table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(User::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(User::Email)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(User::FullName).string_len(255).not_null())
                    .col(ColumnDef::new(User::Phone).string_len(32))
                    .col(
                        ColumnDef::new(User::UserType)
                            .string_len(16)
                            .not_null()
                            .default("tenant"),
                    )
                    .col(ColumnDef::new(User::Token).string_len(64).unique_key())
                    .col(ColumnDef::new(User::DocumentType).string_len(16))
                    .col(ColumnDef::new(User::DocumentNumber).string_len(32))
                    .col(ColumnDef::new(User::Nationality).string_len(64))
                    .col(ColumnDef::new(User::IdentityPhotoUrl).string_len(512))
                    .col(ColumnDef::new(User::IdentitySubmittedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(User::EmailVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(User::PhoneVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(User::IdentityVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(User::IdentityVerifiedBy).string_len(32))
                    .col(ColumnDef::new(User::IdentityVerifiedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(User::SubscriptionActive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(User::SubscriptionExpiresAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(User::DeletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(User::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(User::UpdatedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await?;

        // Review queue scan: eligibility predicate plus FIFO ordering.
        manager
            .create_index(
                Index::create()
                    .name("idx_user_identity_submitted_at")
                    .table(User::Table)
                    .col(User::IdentitySubmittedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_subscription_expires_at")
                    .table(User::Table)
                    .col(User::SubscriptionExpiresAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
    Email,
    FullName,
    Phone,
    UserType,
    Token,
    DocumentType,
    DocumentNumber,
    Nationality,
    IdentityPhotoUrl,
    IdentitySubmittedAt,
    EmailVerified,
    PhoneVerified,
    IdentityVerified,
    IdentityVerifiedBy,
    IdentityVerifiedAt,
    SubscriptionActive,
    SubscriptionExpiresAt,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}
