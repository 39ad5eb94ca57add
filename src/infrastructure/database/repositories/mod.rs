//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

pub mod audit_repository;
pub mod guest_repository;
pub mod receivable_repository;
pub mod repository_provider;
pub mod reservation_repository;
pub mod room_repository;

pub use repository_provider::SeaOrmRepositoryProvider;
