//! Read-only queries for the API layer

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::reservation::{discount_percent, ReservationQuery, DISCOUNT_TIERS};
use crate::domain::{
    AuditEntry, Capability, DomainError, DomainResult, Guest, Principal, Receivable,
    RepositoryProvider, Reservation, ReservationStatus, RoomState,
};
use crate::shared::pagination::{PaginatedResult, PaginationParams};

/// Visit count and loyalty tier of a guest
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuestDiscount {
    pub guest_id: String,
    pub visit_count: u32,
    pub discount_percent: Decimal,
    /// Visits still needed for the next tier, `None` at the top tier
    pub visits_to_next_tier: Option<u32>,
}

pub struct ReservationQueries {
    repos: Arc<dyn RepositoryProvider>,
}

impl ReservationQueries {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    fn authorize_guest_view(actor: &Principal, guest_id: &str) -> DomainResult<()> {
        if actor.id == guest_id {
            Ok(())
        } else {
            actor.require(Capability::ViewAllReservations)
        }
    }

    pub async fn get_reservation(&self, actor: &Principal, id: i32) -> DomainResult<Reservation> {
        let reservation = self
            .repos
            .reservations()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Reservation", "id", id))?;
        Self::authorize_guest_view(actor, &reservation.guest_id)?;
        Ok(reservation)
    }

    /// Booking history of one guest, newest first.
    pub async fn reservations_for_guest(
        &self,
        actor: &Principal,
        guest_id: &str,
        page: PaginationParams,
    ) -> DomainResult<PaginatedResult<Reservation>> {
        Self::authorize_guest_view(actor, guest_id)?;
        self.repos
            .reservations()
            .query_page(&ReservationQuery::for_guest(guest_id), page)
            .await
    }

    /// Reservations in any of `statuses` whose room is in any of
    /// `room_states`, e.g. "confirmed or finalized with room Occupied/Cleaning".
    pub async fn reservations_by_status(
        &self,
        actor: &Principal,
        statuses: &[ReservationStatus],
        room_states: &[RoomState],
        page: PaginationParams,
    ) -> DomainResult<PaginatedResult<Reservation>> {
        actor.require(Capability::ViewAllReservations)?;
        let query = ReservationQuery::default()
            .with_statuses(statuses)
            .with_room_states(room_states);
        self.repos.reservations().query_page(&query, page).await
    }

    pub async fn guest(&self, guest_id: &str) -> DomainResult<Guest> {
        self.repos
            .guests()
            .find_by_id(guest_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Guest", "id", guest_id))
    }

    pub async fn guest_discount(&self, guest_id: &str) -> DomainResult<GuestDiscount> {
        let guest = self.guest(guest_id).await?;
        let visits_to_next_tier = DISCOUNT_TIERS
            .iter()
            .rev()
            .find(|(min_visits, _)| *min_visits > guest.visit_count)
            .map(|(min_visits, _)| min_visits - guest.visit_count);
        Ok(GuestDiscount {
            discount_percent: discount_percent(guest.visit_count),
            visit_count: guest.visit_count,
            guest_id: guest.id,
            visits_to_next_tier,
        })
    }

    pub async fn receivable_for(&self, actor: &Principal, reservation_id: i32) -> DomainResult<Receivable> {
        let reservation = self.get_reservation(actor, reservation_id).await?;
        self.repos
            .receivables()
            .find_by_reservation(reservation.id)
            .await?
            .ok_or_else(|| DomainError::not_found("Receivable", "reservation_id", reservation_id))
    }

    pub async fn audit_trail(&self, actor: &Principal, reservation_id: i32) -> DomainResult<Vec<AuditEntry>> {
        actor.require(Capability::ViewAllReservations)?;
        self.repos.audit().list_for_reservation(reservation_id).await
    }
}
