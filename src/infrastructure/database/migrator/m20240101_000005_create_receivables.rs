//! Create receivables table
//!
//! At most one receivable per reservation; payment references are unique.

use sea_orm_migration::prelude::*;

use super::m20240101_000004_create_reservations::Reservations;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Receivables::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Receivables::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Receivables::ReservationId)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Receivables::GuestId).string_len(20).not_null())
                    .col(ColumnDef::new(Receivables::Total).string().not_null())
                    .col(
                        ColumnDef::new(Receivables::Paid)
                            .string()
                            .not_null()
                            .default("0"),
                    )
                    .col(ColumnDef::new(Receivables::DueDate).date().not_null())
                    .col(
                        ColumnDef::new(Receivables::Status)
                            .string_len(20)
                            .not_null()
                            .default("Pending"),
                    )
                    .col(
                        ColumnDef::new(Receivables::PaymentReference)
                            .string()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Receivables::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Receivables::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_receivables_reservation")
                            .from(Receivables::Table, Receivables::ReservationId)
                            .to(Reservations::Table, Reservations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_receivables_status_due")
                    .table(Receivables::Table)
                    .col(Receivables::Status)
                    .col(Receivables::DueDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Receivables::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Receivables {
    Table,
    Id,
    ReservationId,
    GuestId,
    Total,
    Paid,
    DueDate,
    Status,
    PaymentReference,
    CreatedAt,
    UpdatedAt,
}
