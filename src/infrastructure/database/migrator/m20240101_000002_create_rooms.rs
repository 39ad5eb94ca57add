//! Create rooms table
//!
//! One row per physical room; `state` is the room-level state machine.

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_room_types::RoomTypes;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Rooms::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Rooms::Code)
                            .string_len(10)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Rooms::Number).string_len(10).not_null())
                    .col(ColumnDef::new(Rooms::Floor).integer().not_null())
                    .col(ColumnDef::new(Rooms::RoomTypeId).integer().not_null())
                    .col(
                        ColumnDef::new(Rooms::State)
                            .string_len(20)
                            .not_null()
                            .default("Available"),
                    )
                    .col(ColumnDef::new(Rooms::CurrentPrice).string().not_null())
                    .col(ColumnDef::new(Rooms::Notes).text())
                    .col(ColumnDef::new(Rooms::LastCleanedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Rooms::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Rooms::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rooms_room_type")
                            .from(Rooms::Table, Rooms::RoomTypeId)
                            .to(RoomTypes::Table, RoomTypes::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_rooms_state")
                    .table(Rooms::Table)
                    .col(Rooms::State)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Rooms::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Rooms {
    Table,
    Code,
    Number,
    Floor,
    RoomTypeId,
    State,
    CurrentPrice,
    Notes,
    LastCleanedAt,
    CreatedAt,
    UpdatedAt,
}
