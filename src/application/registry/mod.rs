pub mod guests;
pub mod service;

pub use guests::GuestDirectory;
pub use service::RoomRegistry;
