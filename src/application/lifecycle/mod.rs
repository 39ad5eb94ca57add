//! Reservation lifecycle: state machine, overlap validation, pricing and
//! the room transitions that cascade from them.

mod cascade;
pub mod locks;
mod plan;
pub mod policy;
pub mod service;

pub(crate) use cascade::{first_overlap, snapshot, stage_cancel, stage_confirm, stage_occupy};
pub(crate) use plan::Plan;
pub(crate) use service::observe;

pub use locks::{RoomGuard, RoomLocks};
pub use policy::BookingPolicy;
pub use service::{NewReservation, ReservationLifecycle};
