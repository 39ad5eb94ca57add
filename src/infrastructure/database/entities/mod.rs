//! Database entities module

pub mod audit_log;
pub mod guest;
pub mod receivable;
pub mod reservation;
pub mod room;
pub mod room_type;

pub use audit_log::Entity as AuditLog;
pub use guest::Entity as Guest;
pub use receivable::Entity as Receivable;
pub use reservation::Entity as Reservation;
pub use room::Entity as Room;
pub use room_type::Entity as RoomType;
