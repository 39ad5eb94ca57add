//! # Hotel Core
//!
//! Reservation and room lifecycle engine with a receivable ledger.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Core business entities, state machines and repository ports
//! - **application**: Lifecycle, ledger, registry, projection and queries
//! - **infrastructure**: SeaORM persistence and the in-memory store
//! - **shared**: Errors, shutdown, retry, pagination
//! - **server**: Process runtime used by the CLI

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig, ConfigError};

// Re-export database types for easy access
pub use infrastructure::{connect_and_migrate, init_database, DatabaseConfig, SeaOrmRepositoryProvider};

pub use application::events::{create_event_bus, Event, EventBus, SharedEventBus};
