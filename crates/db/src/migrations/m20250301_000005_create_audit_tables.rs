//! Create audit_log and fraud_flag tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuditLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuditLog::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AuditLog::ActorId).string_len(32).not_null())
                    .col(ColumnDef::new(AuditLog::Action).string_len(64).not_null())
                    .col(
                        ColumnDef::new(AuditLog::TargetType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AuditLog::TargetId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(AuditLog::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audit_log_actor_id")
                    .table(AuditLog::Table)
                    .col(AuditLog::ActorId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FraudFlag::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FraudFlag::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FraudFlag::EntityType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(FraudFlag::EntityId).string_len(32).not_null())
                    .col(ColumnDef::new(FraudFlag::Rule).string_len(64).not_null())
                    .col(ColumnDef::new(FraudFlag::Score).integer().not_null())
                    .col(
                        ColumnDef::new(FraudFlag::Resolved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(FraudFlag::ResolvedBy).string_len(32))
                    .col(
                        ColumnDef::new(FraudFlag::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_fraud_flag_entity")
                    .table(FraudFlag::Table)
                    .col(FraudFlag::EntityType)
                    .col(FraudFlag::EntityId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FraudFlag::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AuditLog::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AuditLog {
    Table,
    Id,
    ActorId,
    Action,
    TargetType,
    TargetId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum FraudFlag {
    Table,
    Id,
    EntityType,
    EntityId,
    Rule,
    Score,
    Resolved,
    ResolvedBy,
    CreatedAt,
}
