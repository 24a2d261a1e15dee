//! Create property_alert table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PropertyAlert::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PropertyAlert::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PropertyAlert::UserId).string_len(32))
                    .col(
                        ColumnDef::new(PropertyAlert::FullName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PropertyAlert::Email)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PropertyAlert::Phone).string_len(32))
                    .col(
                        ColumnDef::new(PropertyAlert::PropertyType)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PropertyAlert::State).string_len(64))
                    .col(ColumnDef::new(PropertyAlert::City).string_len(64))
                    .col(ColumnDef::new(PropertyAlert::MinPrice).big_integer())
                    .col(ColumnDef::new(PropertyAlert::MaxPrice).big_integer())
                    .col(ColumnDef::new(PropertyAlert::Bedrooms).integer())
                    .col(ColumnDef::new(PropertyAlert::Bathrooms).integer())
                    .col(
                        ColumnDef::new(PropertyAlert::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(PropertyAlert::NotifiedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(PropertyAlert::MatchedPropertyId).string_len(32))
                    .col(
                        ColumnDef::new(PropertyAlert::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_property_alert_user")
                            .from(PropertyAlert::Table, PropertyAlert::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Dispatch scan: open alerts for a property type.
        manager
            .create_index(
                Index::create()
                    .name("idx_property_alert_open")
                    .table(PropertyAlert::Table)
                    .col(PropertyAlert::PropertyType)
                    .col(PropertyAlert::NotifiedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PropertyAlert::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PropertyAlert {
    Table,
    Id,
    UserId,
    FullName,
    Email,
    Phone,
    PropertyType,
    State,
    City,
    MinPrice,
    MaxPrice,
    Bedrooms,
    Bathrooms,
    Active,
    NotifiedAt,
    MatchedPropertyId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
}
