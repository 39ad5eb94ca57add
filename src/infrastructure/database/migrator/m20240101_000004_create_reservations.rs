//! Create reservations table
//!
//! Stay windows are indexed per room for the overlap check.

use sea_orm_migration::prelude::*;

use super::m20240101_000002_create_rooms::Rooms;
use super::m20240101_000003_create_guests::Guests;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reservations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reservations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Reservations::GuestId).string_len(20).not_null())
                    .col(ColumnDef::new(Reservations::StaffId).string())
                    .col(ColumnDef::new(Reservations::RoomCode).string_len(10).not_null())
                    .col(ColumnDef::new(Reservations::Kind).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Reservations::Status)
                            .string_len(20)
                            .not_null()
                            .default("Pending"),
                    )
                    .col(
                        ColumnDef::new(Reservations::Checkin)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reservations::Checkout)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Reservations::ActualCheckin).timestamp_with_time_zone())
                    .col(ColumnDef::new(Reservations::ActualCheckout).timestamp_with_time_zone())
                    .col(ColumnDef::new(Reservations::NightlyPrice).string().not_null())
                    .col(
                        ColumnDef::new(Reservations::Discount)
                            .string()
                            .not_null()
                            .default("0"),
                    )
                    .col(
                        ColumnDef::new(Reservations::Taxes)
                            .string()
                            .not_null()
                            .default("0"),
                    )
                    .col(
                        ColumnDef::new(Reservations::GuestCount)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Reservations::Notes).text())
                    .col(ColumnDef::new(Reservations::CancellationReason).text())
                    .col(
                        ColumnDef::new(Reservations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reservations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservations_room")
                            .from(Reservations::Table, Reservations::RoomCode)
                            .to(Rooms::Table, Rooms::Code)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reservations_guest")
                            .from(Reservations::Table, Reservations::GuestId)
                            .to(Guests::Table, Guests::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reservations_room_window")
                    .table(Reservations::Table)
                    .col(Reservations::RoomCode)
                    .col(Reservations::Checkin)
                    .col(Reservations::Checkout)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reservations_guest")
                    .table(Reservations::Table)
                    .col(Reservations::GuestId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reservations_status")
                    .table(Reservations::Table)
                    .col(Reservations::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reservations::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Reservations {
    Table,
    Id,
    GuestId,
    StaffId,
    RoomCode,
    Kind,
    Status,
    Checkin,
    Checkout,
    ActualCheckin,
    ActualCheckout,
    NightlyPrice,
    Discount,
    Taxes,
    GuestCount,
    Notes,
    CancellationReason,
    CreatedAt,
    UpdatedAt,
}
