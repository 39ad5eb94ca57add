//! Domain events
//!
//! Facts about committed state changes. The EventBus implementation lives
//! in `application::events`.

pub mod types;

pub use types::{
    Event, EventMessage, ReceivableStateChangedEvent, ReservationStateChangedEvent,
    RoomStateChangedEvent, SettlementUnconfirmedEvent,
};
