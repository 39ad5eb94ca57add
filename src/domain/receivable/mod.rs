//! Receivable aggregate

pub mod model;
pub mod repository;

pub use model::{Receivable, ReceivableStatus};
pub use repository::ReceivableRepository;
