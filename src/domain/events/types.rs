//! Change events
//!
//! Emitted after a lifecycle commit succeeds; consumed by read-model
//! projections and any push/notification collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::receivable::ReceivableStatus;
use crate::domain::reservation::ReservationStatus;
use crate::domain::room::RoomState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    RoomStateChanged(RoomStateChangedEvent),
    ReservationStateChanged(ReservationStateChangedEvent),
    ReceivableStateChanged(ReceivableStateChangedEvent),
    /// Payment succeeded but the reservation could not be confirmed
    SettlementUnconfirmed(SettlementUnconfirmedEvent),
}

impl Event {
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::RoomStateChanged(_) => "room_state_changed",
            Event::ReservationStateChanged(_) => "reservation_state_changed",
            Event::ReceivableStateChanged(_) => "receivable_state_changed",
            Event::SettlementUnconfirmed(_) => "settlement_unconfirmed",
        }
    }

    pub fn room_code(&self) -> Option<&str> {
        match self {
            Event::RoomStateChanged(e) => Some(&e.room_code),
            Event::ReservationStateChanged(e) => Some(&e.room_code),
            Event::ReceivableStateChanged(_) => None,
            Event::SettlementUnconfirmed(e) => Some(&e.room_code),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomStateChangedEvent {
    pub room_code: String,
    pub old_state: RoomState,
    pub new_state: RoomState,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationStateChangedEvent {
    pub reservation_id: i32,
    pub room_code: String,
    /// `None` on creation
    pub old_state: Option<ReservationStatus>,
    pub new_state: ReservationStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceivableStateChangedEvent {
    pub receivable_id: String,
    pub reservation_id: i32,
    pub new_state: ReceivableStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementUnconfirmedEvent {
    pub receivable_id: String,
    pub reservation_id: i32,
    pub room_code: String,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// Event envelope with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let msg = EventMessage::new(Event::RoomStateChanged(RoomStateChangedEvent {
            room_code: "A1".into(),
            old_state: RoomState::Available,
            new_state: RoomState::Reserved,
            timestamp: Utc::now(),
        }));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "RoomStateChanged");
        assert_eq!(json["data"]["new_state"], "Reserved");
        assert_eq!(msg.event.room_code(), Some("A1"));
    }
}
