//! Reservation aggregate
//!
//! Contains the Reservation entity, stay pricing, and repository interface.

pub mod model;
pub mod pricing;
pub mod repository;

pub use model::{Reservation, ReservationKind, ReservationStatus, StayWindow};
pub use pricing::{discount_percent, Quote, DISCOUNT_TIERS};
pub use repository::{ReservationQuery, ReservationRepository};
