//! Database migrations module

pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_room_types;
mod m20240101_000002_create_rooms;
mod m20240101_000003_create_guests;
mod m20240101_000004_create_reservations;
mod m20240101_000005_create_receivables;
mod m20240101_000006_create_audit_log;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_room_types::Migration),
            Box::new(m20240101_000002_create_rooms::Migration),
            Box::new(m20240101_000003_create_guests::Migration),
            Box::new(m20240101_000004_create_reservations::Migration),
            Box::new(m20240101_000005_create_receivables::Migration),
            Box::new(m20240101_000006_create_audit_log::Migration),
        ]
    }
}
