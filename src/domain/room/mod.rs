//! Room aggregate
//!
//! Physical rooms, their category, and the occupancy state machine.

pub mod model;
pub mod repository;

pub use model::{Room, RoomState, RoomType, TransitionSource};
pub use repository::{RoomFilter, RoomRepository};
