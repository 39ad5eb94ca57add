//! Repository traits for the domain layer
//!
//! Contains:
//! - `RepositoryProvider`: unified access to all per-aggregate repositories
//! - `Changeset`: the atomic write unit for lifecycle operations
//! - `DomainResult`: standard result type for domain operations

use async_trait::async_trait;

use super::audit::{AuditEntry, AuditRepository};
use super::guest::GuestRepository;
use super::receivable::{Receivable, ReceivableRepository};
use super::reservation::{Reservation, ReservationRepository};
use super::room::{Room, RoomRepository};
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

// ── Changeset ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Change<T> {
    Insert(T),
    Update(T),
}

impl<T> Change<T> {
    pub fn value(&self) -> &T {
        match self {
            Change::Insert(v) | Change::Update(v) => v,
        }
    }

    pub fn is_insert(&self) -> bool {
        matches!(self, Change::Insert(_))
    }
}

/// Every row touched by one lifecycle operation. Applied all-or-nothing.
///
/// When `reservation` is an insert, the store assigns its id and rewrites
/// `receivable.reservation_id` and audit `reservation_id`s that are `0`.
#[derive(Debug, Clone, Default)]
pub struct Changeset {
    pub reservation: Option<Change<Reservation>>,
    pub rooms: Vec<Change<Room>>,
    pub receivable: Option<Change<Receivable>>,
    /// Guests whose visit counter goes up by one. The store increments the
    /// stored value in place, so concurrent commits never overwrite each other.
    pub guest_visits: Vec<String>,
    pub audit: Vec<AuditEntry>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reservation(mut self, change: Change<Reservation>) -> Self {
        self.reservation = Some(change);
        self
    }

    pub fn with_room(mut self, change: Change<Room>) -> Self {
        self.rooms.push(change);
        self
    }

    pub fn with_receivable(mut self, change: Change<Receivable>) -> Self {
        self.receivable = Some(change);
        self
    }

    pub fn with_guest_visit(mut self, guest_id: impl Into<String>) -> Self {
        self.guest_visits.push(guest_id.into());
        self
    }

    pub fn with_audit(mut self, entry: AuditEntry) -> Self {
        self.audit.push(entry);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.reservation.is_none()
            && self.rooms.is_empty()
            && self.receivable.is_none()
            && self.guest_visits.is_empty()
            && self.audit.is_empty()
    }

    /// Short label of the first write, used in `CascadeFailure` reports.
    pub fn primary(&self) -> &'static str {
        if self.reservation.is_some() {
            "reservation"
        } else if !self.rooms.is_empty() {
            "room"
        } else if self.receivable.is_some() {
            "receivable"
        } else if !self.guest_visits.is_empty() {
            "guest"
        } else {
            "audit"
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Id of the reservation written by the changeset, if any
    pub reservation_id: Option<i32>,
}

// ── RepositoryProvider ──────────────────────────────────────────

/// Provides access to all domain repositories.
///
/// Reads go through the per-aggregate repositories; lifecycle writes go
/// through [`RepositoryProvider::commit`] so that reservation, room,
/// receivable and audit rows change together or not at all.
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) -> DomainResult<()> {
///     let room = repos.rooms().find_by_code("A1").await?;
///     let receipt = repos.commit(changeset).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    fn rooms(&self) -> &dyn RoomRepository;
    fn reservations(&self) -> &dyn ReservationRepository;
    fn receivables(&self) -> &dyn ReceivableRepository;
    fn guests(&self) -> &dyn GuestRepository;
    fn audit(&self) -> &dyn AuditRepository;

    async fn commit(&self, changeset: Changeset) -> DomainResult<CommitReceipt>;
}
