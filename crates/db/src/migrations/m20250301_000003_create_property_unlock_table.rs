//! Create property_unlock table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PropertyUnlock::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PropertyUnlock::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PropertyUnlock::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PropertyUnlock::PropertyId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PropertyUnlock::Reference)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(PropertyUnlock::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PropertyUnlock::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(PropertyUnlock::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(PropertyUnlock::UnlockedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_property_unlock_user")
                            .from(PropertyUnlock::Table, PropertyUnlock::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_property_unlock_property")
                            .from(PropertyUnlock::Table, PropertyUnlock::PropertyId)
                            .to(Property::Table, Property::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One row per pair: the index arbitrates concurrent initializations.
        manager
            .create_index(
                Index::create()
                    .name("idx_property_unlock_pair")
                    .table(PropertyUnlock::Table)
                    .col(PropertyUnlock::UserId)
                    .col(PropertyUnlock::PropertyId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PropertyUnlock::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PropertyUnlock {
    Table,
    Id,
    UserId,
    PropertyId,
    Reference,
    Amount,
    Status,
    CreatedAt,
    UnlockedAt,
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Property {
    Table,
    Id,
}
