//! Booking rules that vary per deployment

use rust_decimal::Decimal;

use crate::domain::RoomState;

#[derive(Debug, Clone, PartialEq)]
pub struct BookingPolicy {
    /// Applied to `subtotal - discount`
    pub tax_rate_percent: Decimal,
    /// Receivable due date = creation date + this many days
    pub payment_grace_days: i64,
    pub open_receivable_on_create: bool,
    /// Allow overlapping Pending reservations at creation; overlap is then
    /// enforced only when a reservation is confirmed.
    pub tentative_overlap: bool,
    /// Room states that reject new reservations
    pub blocking_states: Vec<RoomState>,
}

impl BookingPolicy {
    /// Creation rejects any active overlap and any room that is not free.
    pub fn strict() -> Self {
        Self {
            tax_rate_percent: Decimal::ZERO,
            payment_grace_days: 3,
            open_receivable_on_create: true,
            tentative_overlap: false,
            blocking_states: vec![
                RoomState::Occupied,
                RoomState::Reserved,
                RoomState::Cleaning,
                RoomState::Maintenance,
            ],
        }
    }

    /// Pending reservations act as tentative holds: several may overlap and
    /// a Reserved room still accepts new requests for other dates.
    pub fn tentative_holds() -> Self {
        Self {
            tentative_overlap: true,
            blocking_states: vec![RoomState::Occupied, RoomState::Cleaning, RoomState::Maintenance],
            ..Self::strict()
        }
    }

    pub fn blocks(&self, state: RoomState) -> bool {
        self.blocking_states.contains(&state)
    }
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self::strict()
    }
}
