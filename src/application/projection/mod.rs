//! Read models fed by committed change events

pub mod availability;

pub use availability::{AvailabilityProjection, DashboardSnapshot, RoomView};
