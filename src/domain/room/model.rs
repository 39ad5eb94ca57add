//! Room domain entity and its occupancy state machine

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult};

/// Room occupancy state. Exactly one holds at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomState {
    Available,
    Reserved,
    Occupied,
    Cleaning,
    Maintenance,
}

impl RoomState {
    pub const ALL: [RoomState; 5] = [
        Self::Available,
        Self::Reserved,
        Self::Occupied,
        Self::Cleaning,
        Self::Maintenance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Reserved => "Reserved",
            Self::Occupied => "Occupied",
            Self::Cleaning => "Cleaning",
            Self::Maintenance => "Maintenance",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DomainError::Validation(format!("unknown room state '{}'", s)))
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Who is driving a room transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionSource {
    /// A reservation lifecycle cascade (confirm, cancel, check-in, check-out, settle).
    Lifecycle,
    /// Manual correction by an operator, bypassing reservation linkage.
    Operator,
}

impl RoomState {
    /// Whether `self -> target` is an edge of the room state machine for
    /// the given source.
    pub fn can_transition_to(self, target: RoomState, source: TransitionSource) -> bool {
        use RoomState::*;
        match source {
            TransitionSource::Lifecycle => matches!(
                (self, target),
                (Available, Reserved)
                    | (Reserved, Available)
                    | (Reserved, Occupied)
                    | (Occupied, Cleaning)
                    | (Cleaning, Available)
            ),
            // Rooms linked to a reservation (Reserved/Occupied) cannot be forced.
            TransitionSource::Operator => matches!(
                (self, target),
                (Cleaning, Available)
                    | (Maintenance, Available)
                    | (Available, Maintenance)
                    | (Cleaning, Maintenance)
            ),
        }
    }
}

/// Room category. Immutable while an active reservation references a room of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomType {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub max_capacity: i32,
    pub base_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Unique room code
    pub code: String,
    pub number: String,
    pub floor: i32,
    pub room_type: RoomType,
    pub state: RoomState,
    /// Nightly price currently charged
    pub current_price: Decimal,
    pub notes: Option<String>,
    pub last_cleaned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Room {
    /// New rooms enter inventory Available, priced at the type's base price.
    pub fn new(code: impl Into<String>, number: impl Into<String>, floor: i32, room_type: RoomType) -> Self {
        let now = Utc::now();
        Self {
            code: code.into(),
            number: number.into(),
            floor,
            current_price: room_type.base_price,
            room_type,
            state: RoomState::Available,
            notes: None,
            last_cleaned_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a state transition, returning the previous state.
    pub fn transition(&mut self, target: RoomState, source: TransitionSource) -> DomainResult<RoomState> {
        if !self.state.can_transition_to(target, source) {
            return Err(DomainError::InvalidTransition {
                entity: "Room",
                id: self.code.clone(),
                from: self.state.to_string(),
                to: target.to_string(),
            });
        }
        let previous = self.state;
        self.state = target;
        self.updated_at = Utc::now();
        if previous == RoomState::Cleaning && target == RoomState::Available {
            self.last_cleaned_at = Some(self.updated_at);
        }
        Ok(previous)
    }

    pub fn is_available(&self) -> bool {
        self.state == RoomState::Available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn double() -> RoomType {
        RoomType {
            id: 1,
            name: "Double".into(),
            description: None,
            max_capacity: 2,
            base_price: Decimal::new(100, 0),
        }
    }

    #[test]
    fn new_room_is_available_at_base_price() {
        let room = Room::new("A1", "101", 1, double());
        assert!(room.is_available());
        assert_eq!(room.current_price, Decimal::new(100, 0));
    }

    #[test]
    fn lifecycle_walks_the_full_cycle() {
        let mut room = Room::new("A1", "101", 1, double());
        for target in [
            RoomState::Reserved,
            RoomState::Occupied,
            RoomState::Cleaning,
            RoomState::Available,
        ] {
            room.transition(target, TransitionSource::Lifecycle).unwrap();
        }
        assert!(room.is_available());
        assert!(room.last_cleaned_at.is_some());
    }

    #[test]
    fn lifecycle_cannot_skip_states() {
        let mut room = Room::new("A1", "101", 1, double());
        let err = room
            .transition(RoomState::Occupied, TransitionSource::Lifecycle)
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
        assert_eq!(room.state, RoomState::Available);
    }

    #[test]
    fn operator_cannot_force_linked_rooms() {
        let mut room = Room::new("A1", "101", 1, double());
        room.transition(RoomState::Reserved, TransitionSource::Lifecycle).unwrap();
        assert!(room
            .transition(RoomState::Maintenance, TransitionSource::Operator)
            .is_err());
        assert!(room
            .transition(RoomState::Available, TransitionSource::Operator)
            .is_err());
    }

    #[test]
    fn operator_maintenance_round_trip() {
        let mut room = Room::new("A1", "101", 1, double());
        room.transition(RoomState::Maintenance, TransitionSource::Operator).unwrap();
        room.transition(RoomState::Available, TransitionSource::Operator).unwrap();
        assert!(room.is_available());
        // Only Cleaning -> Available counts as a cleaning.
        assert!(room.last_cleaned_at.is_none());
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(RoomState::parse("cleaning").unwrap(), RoomState::Cleaning);
        assert!(RoomState::parse("Flooded").is_err());
    }
}
