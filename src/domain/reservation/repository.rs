//! Reservation repository interface

use async_trait::async_trait;

use super::model::{Reservation, ReservationStatus, StayWindow};
use crate::domain::room::RoomState;
use crate::domain::DomainResult;
use crate::shared::pagination::{PaginatedResult, PaginationParams};

/// Read-side criteria for reservation listings. Empty vectors do not filter.
#[derive(Debug, Clone, Default)]
pub struct ReservationQuery {
    pub guest_id: Option<String>,
    pub room_code: Option<String>,
    pub statuses: Vec<ReservationStatus>,
    /// Only reservations whose room is currently in one of these states
    pub room_states: Vec<RoomState>,
}

impl ReservationQuery {
    pub fn for_guest(guest_id: impl Into<String>) -> Self {
        Self {
            guest_id: Some(guest_id.into()),
            ..Self::default()
        }
    }

    pub fn with_statuses(mut self, statuses: &[ReservationStatus]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }

    pub fn with_room_states(mut self, states: &[RoomState]) -> Self {
        self.room_states = states.to_vec();
        self
    }
}

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Reservation>>;

    /// Reservations on `room_code` in one of `statuses` whose window overlaps
    /// `window`, excluding `exclude_id`.
    async fn find_overlapping(
        &self,
        room_code: &str,
        window: &StayWindow,
        statuses: &[ReservationStatus],
        exclude_id: Option<i32>,
    ) -> DomainResult<Vec<Reservation>>;

    /// Newest first
    async fn query(&self, query: &ReservationQuery) -> DomainResult<Vec<Reservation>>;

    /// One page of [`ReservationRepository::query`], with the total match count.
    async fn query_page(
        &self,
        query: &ReservationQuery,
        page: PaginationParams,
    ) -> DomainResult<PaginatedResult<Reservation>>;

    /// Number of reservations (any status) referencing the room
    async fn count_for_room(&self, room_code: &str) -> DomainResult<u64>;
}
