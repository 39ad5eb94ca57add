//! Create audit_log table

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
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AuditLog::ReservationId).integer())
                    .col(ColumnDef::new(AuditLog::RoomCode).string_len(10))
                    .col(ColumnDef::new(AuditLog::ActorId).string().not_null())
                    .col(ColumnDef::new(AuditLog::Action).string_len(30).not_null())
                    .col(ColumnDef::new(AuditLog::Description).text().not_null())
                    .col(
                        ColumnDef::new(AuditLog::Previous)
                            .text()
                            .not_null()
                            .default("null"),
                    )
                    .col(
                        ColumnDef::new(AuditLog::Current)
                            .text()
                            .not_null()
                            .default("null"),
                    )
                    .col(
                        ColumnDef::new(AuditLog::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audit_log_reservation")
                    .table(AuditLog::Table)
                    .col(AuditLog::ReservationId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audit_log_room")
                    .table(AuditLog::Table)
                    .col(AuditLog::RoomCode)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuditLog::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum AuditLog {
    Table,
    Id,
    ReservationId,
    RoomCode,
    ActorId,
    Action,
    Description,
    Previous,
    Current,
    CreatedAt,
}
