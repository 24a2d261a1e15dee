//! Create property table.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Property::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Property::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Property::LandlordId).string_len(32).not_null())
                    .col(ColumnDef::new(Property::Title).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Property::PropertyType)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Property::State).string_len(64).not_null())
                    .col(ColumnDef::new(Property::City).string_len(64).not_null())
                    .col(ColumnDef::new(Property::RentAmount).big_integer().not_null())
                    .col(ColumnDef::new(Property::Bedrooms).integer().not_null())
                    .col(ColumnDef::new(Property::Bathrooms).integer().not_null())
                    .col(ColumnDef::new(Property::Rating).integer())
                    .col(
                        ColumnDef::new(Property::FullAddress)
                            .string_len(512)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Property::Amenities)
                            .json_binary()
                            .not_null()
                            .default("[]"),
                    )
                    .col(ColumnDef::new(Property::VideoUrl).string_len(512))
                    .col(
                        ColumnDef::new(Property::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Property::ModeratedBy).string_len(32))
                    .col(ColumnDef::new(Property::ModeratedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Property::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Property::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_property_landlord")
                            .from(Property::Table, Property::LandlordId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_property_status")
                    .table(Property::Table)
                    .col(Property::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_property_landlord_id")
                    .table(Property::Table)
                    .col(Property::LandlordId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Property::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Property {
    Table,
    Id,
    LandlordId,
    Title,
    PropertyType,
    State,
    City,
    RentAmount,
    Bedrooms,
    Bathrooms,
    Rating,
    FullAddress,
    Amenities,
    VideoUrl,
    Status,
    ModeratedBy,
    ModeratedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
}
