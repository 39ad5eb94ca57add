pub mod access;
pub mod audit;
pub mod events;
pub mod guest;
pub mod receivable;
pub mod repositories;
pub mod reservation;
pub mod room;

// Re-export commonly used types
pub use access::{Capability, Principal, Role};
pub use audit::{AuditAction, AuditEntry};
pub use guest::Guest;
pub use receivable::{Receivable, ReceivableStatus};
pub use repositories::{Change, Changeset, CommitReceipt, DomainResult, RepositoryProvider};
pub use reservation::{Reservation, ReservationKind, ReservationStatus, StayWindow};
pub use room::{Room, RoomState, RoomType, TransitionSource};

pub use crate::shared::errors::{DomainError, ErrorKind};
