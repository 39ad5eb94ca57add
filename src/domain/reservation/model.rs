//! Reservation domain entity and its lifecycle state machine

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult};

/// Reservation lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReservationStatus {
    /// Created, awaiting staff confirmation or payment
    Pending,
    /// Booking committed, room held
    Confirmed,
    /// Withdrawn before check-in
    Cancelled,
    /// Guest is in the room
    CheckedIn,
    /// Guest checked out
    Finalized,
}

impl ReservationStatus {
    /// States that block overlapping bookings on the same room.
    pub const ACTIVE: [ReservationStatus; 3] = [Self::Pending, Self::Confirmed, Self::CheckedIn];

    /// Active states that hold the room (no longer tentative).
    pub const COMMITTED: [ReservationStatus; 2] = [Self::Confirmed, Self::CheckedIn];

    pub const ALL: [ReservationStatus; 5] = [
        Self::Pending,
        Self::Confirmed,
        Self::Cancelled,
        Self::CheckedIn,
        Self::Finalized,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Cancelled => "Cancelled",
            Self::CheckedIn => "CheckedIn",
            Self::Finalized => "Finalized",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| DomainError::Validation(format!("unknown reservation status '{}'", s)))
    }

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Finalized)
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the booking was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationKind {
    /// Booked at the front desk; a staff member must be assigned
    InPerson,
    /// Booked remotely by the guest
    Online,
}

impl ReservationKind {
    pub fn requires_presence(&self) -> bool {
        matches!(self, Self::InPerson)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InPerson => "InPerson",
            Self::Online => "Online",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "InPerson" => Ok(Self::InPerson),
            "Online" => Ok(Self::Online),
            other => Err(DomainError::Validation(format!("unknown reservation kind '{}'", other))),
        }
    }
}

/// Scheduled `[checkin, checkout)` window of a stay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayWindow {
    pub checkin: DateTime<Utc>,
    pub checkout: DateTime<Utc>,
}

impl StayWindow {
    pub fn new(checkin: DateTime<Utc>, checkout: DateTime<Utc>) -> DomainResult<Self> {
        if checkout <= checkin {
            return Err(DomainError::Validation(
                "checkout must be after checkin".to_string(),
            ));
        }
        Ok(Self { checkin, checkout })
    }

    /// Half-open overlap: `[a, b)` and `[c, d)` overlap iff `a < d && c < b`.
    pub fn overlaps(&self, other: &StayWindow) -> bool {
        self.checkin < other.checkout && other.checkin < self.checkout
    }

    /// Whole nights, never less than one.
    pub fn nights(&self) -> i64 {
        (self.checkout - self.checkin).num_days().max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    /// Assigned by the store on insert (0 until persisted)
    pub id: i32,
    pub guest_id: String,
    pub staff_id: Option<String>,
    pub room_code: String,
    pub kind: ReservationKind,
    pub status: ReservationStatus,
    pub window: StayWindow,
    pub actual_checkin: Option<DateTime<Utc>>,
    pub actual_checkout: Option<DateTime<Utc>>,
    pub nightly_price: Decimal,
    pub discount: Decimal,
    pub taxes: Decimal,
    pub guest_count: i32,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    pub fn nights(&self) -> i64 {
        self.window.nights()
    }

    pub fn subtotal(&self) -> Decimal {
        self.nightly_price * Decimal::from(self.nights())
    }

    pub fn total(&self) -> Decimal {
        self.subtotal() - self.discount + self.taxes
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn invalid(&self, to: ReservationStatus) -> DomainError {
        DomainError::InvalidTransition {
            entity: "Reservation",
            id: self.id.to_string(),
            from: self.status.to_string(),
            to: to.to_string(),
        }
    }

    /// Pending -> Confirmed
    pub fn confirm(&mut self) -> DomainResult<()> {
        if self.status != ReservationStatus::Pending {
            return Err(DomainError::NotPending {
                id: self.id,
                status: self.status.to_string(),
            });
        }
        self.status = ReservationStatus::Confirmed;
        self.touch();
        Ok(())
    }

    /// Pending | Confirmed -> Cancelled
    pub fn cancel(&mut self, reason: Option<String>) -> DomainResult<()> {
        match self.status {
            ReservationStatus::Pending | ReservationStatus::Confirmed => {
                self.status = ReservationStatus::Cancelled;
                self.cancellation_reason = reason;
                self.touch();
                Ok(())
            }
            _ => Err(self.invalid(ReservationStatus::Cancelled)),
        }
    }

    /// Confirmed -> CheckedIn
    pub fn check_in(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        if self.status != ReservationStatus::Confirmed {
            return Err(DomainError::NotConfirmed {
                id: self.id,
                status: self.status.to_string(),
            });
        }
        self.status = ReservationStatus::CheckedIn;
        self.actual_checkin = Some(at);
        self.touch();
        Ok(())
    }

    /// CheckedIn -> Finalized. Requires a recorded check-in.
    pub fn check_out(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        match (self.status, self.actual_checkin) {
            (ReservationStatus::CheckedIn, Some(_)) => {
                self.status = ReservationStatus::Finalized;
                self.actual_checkout = Some(at);
                self.touch();
                Ok(())
            }
            (ReservationStatus::Pending | ReservationStatus::Confirmed, _)
            | (ReservationStatus::CheckedIn, None) => {
                Err(DomainError::NoCheckinRecorded { id: self.id })
            }
            _ => Err(self.invalid(ReservationStatus::Finalized)),
        }
    }
}
