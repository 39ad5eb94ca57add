pub mod service;

pub use service::{GuestDiscount, ReservationQueries};
