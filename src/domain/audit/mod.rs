pub mod model;
pub mod repository;

pub use model::{AuditAction, AuditEntry};
pub use repository::AuditRepository;
