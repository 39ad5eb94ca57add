//! Room registry: inventory, availability queries and operator corrections

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;

use crate::application::events::SharedEventBus;
use crate::application::lifecycle::{first_overlap, observe, Plan, RoomLocks};
use crate::domain::reservation::{ReservationQuery, StayWindow};
use crate::domain::room::RoomFilter;
use crate::domain::{
    AuditAction, AuditEntry, Capability, Change, Changeset, DomainError, DomainResult, Principal,
    RepositoryProvider, ReservationStatus, Room, RoomState, RoomType, TransitionSource,
};

pub struct RoomRegistry {
    repos: Arc<dyn RepositoryProvider>,
    events: SharedEventBus,
    locks: RoomLocks,
}

impl RoomRegistry {
    pub fn new(repos: Arc<dyn RepositoryProvider>, events: SharedEventBus, locks: RoomLocks) -> Self {
        Self { repos, events, locks }
    }

    pub async fn get_room(&self, code: &str) -> DomainResult<Room> {
        self.repos
            .rooms()
            .find_by_code(code)
            .await?
            .ok_or_else(|| DomainError::not_found("Room", "code", code))
    }

    /// Rooms matching `filter` that are currently Available.
    pub async fn list_available(&self, filter: &RoomFilter) -> DomainResult<Vec<Room>> {
        let filter = RoomFilter {
            state: Some(RoomState::Available),
            ..filter.clone()
        };
        self.repos.rooms().list(&filter).await
    }

    pub async fn list(&self, filter: &RoomFilter) -> DomainResult<Vec<Room>> {
        self.repos.rooms().list(filter).await
    }

    /// Available rooms with no active reservation overlapping the stay.
    pub async fn search_available(
        &self,
        filter: &RoomFilter,
        checkin: DateTime<Utc>,
        checkout: DateTime<Utc>,
    ) -> DomainResult<Vec<Room>> {
        let window = StayWindow::new(checkin, checkout)?;
        let mut free = Vec::new();
        for room in self.list_available(filter).await? {
            let overlap = first_overlap(
                self.repos.as_ref(),
                &room.code,
                &window,
                &ReservationStatus::ACTIVE,
                None,
            )
            .await?;
            if overlap.is_none() {
                free.push(room);
            }
        }
        Ok(free)
    }

    /// Operator correction bypassing reservation linkage: Cleaning/Maintenance
    /// back to Available, or forcing a free room into Maintenance.
    pub async fn transition(&self, actor: &Principal, code: &str, target: RoomState) -> DomainResult<Room> {
        observe("room_override", self.transition_inner(actor, code, target).await)
    }

    async fn transition_inner(&self, actor: &Principal, code: &str, target: RoomState) -> DomainResult<Room> {
        actor.require(Capability::OverrideRoomState)?;
        let _guard = self.locks.acquire(code).await;

        let mut room = self.get_room(code).await?;
        let previous = room.transition(target, TransitionSource::Operator)?;

        let mut plan = Plan::new();
        plan.audit(
            AuditEntry::new(&actor.id, AuditAction::RoomOverride, format!("Room set to {}", target))
                .room(code)
                .change(
                    serde_json::json!({ "state": previous }),
                    serde_json::json!({ "state": target }),
                ),
        );
        plan.room(room.clone(), previous);
        plan.commit(self.repos.as_ref(), &self.events).await?;

        info!(room_code = code, from = %previous, to = %target, actor = %actor.id, "Room state overridden");
        Ok(room)
    }

    // ── inventory ───────────────────────────────────────────────

    pub async fn register_type(&self, actor: &Principal, room_type: RoomType) -> DomainResult<RoomType> {
        actor.require(Capability::ManageInventory)?;
        if room_type.name.trim().is_empty() {
            return Err(DomainError::Validation("room type name must not be empty".to_string()));
        }
        if room_type.max_capacity < 1 {
            return Err(DomainError::Validation("room type capacity must be positive".to_string()));
        }
        if room_type.base_price <= Decimal::ZERO {
            return Err(DomainError::Validation("room type base price must be positive".to_string()));
        }
        let saved = self.repos.rooms().save_type(room_type).await?;
        info!(room_type_id = saved.id, name = %saved.name, "Room type registered");
        Ok(saved)
    }

    pub async fn register_room(
        &self,
        actor: &Principal,
        code: &str,
        number: &str,
        floor: i32,
        room_type_id: i32,
    ) -> DomainResult<Room> {
        actor.require(Capability::ManageInventory)?;
        if code.trim().is_empty() {
            return Err(DomainError::Validation("room code must not be empty".to_string()));
        }
        let _guard = self.locks.acquire(code).await;
        if self.repos.rooms().find_by_code(code).await?.is_some() {
            return Err(DomainError::Validation(format!("room {} already exists", code)));
        }
        let room_type = self
            .repos
            .rooms()
            .find_type(room_type_id)
            .await?
            .ok_or_else(|| DomainError::not_found("RoomType", "id", room_type_id))?;

        let room = Room::new(code, number, floor, room_type);
        self.repos
            .commit(Changeset::new().with_room(Change::Insert(room.clone())))
            .await?;

        info!(room_code = code, floor, room_type_id, "Room registered");
        Ok(room)
    }

    /// Change a room's category. Refused while an active reservation holds it.
    pub async fn change_room_type(&self, actor: &Principal, code: &str, room_type_id: i32) -> DomainResult<Room> {
        actor.require(Capability::ManageInventory)?;
        let _guard = self.locks.acquire(code).await;

        let mut room = self.get_room(code).await?;
        let active = self
            .repos
            .reservations()
            .query(&ReservationQuery {
                room_code: Some(code.to_string()),
                ..ReservationQuery::default()
            }
            .with_statuses(&ReservationStatus::ACTIVE))
            .await?;
        if let Some(held) = active.first() {
            return Err(DomainError::Validation(format!(
                "room {} type is locked by active reservation {}",
                code, held.id
            )));
        }

        let room_type = self
            .repos
            .rooms()
            .find_type(room_type_id)
            .await?
            .ok_or_else(|| DomainError::not_found("RoomType", "id", room_type_id))?;
        room.current_price = room_type.base_price;
        room.room_type = room_type;
        room.updated_at = Utc::now();
        self.repos
            .commit(Changeset::new().with_room(Change::Update(room.clone())))
            .await?;

        info!(room_code = code, room_type_id, "Room type changed");
        Ok(room)
    }

    /// Remove a room never referenced by any reservation.
    pub async fn retire_room(&self, actor: &Principal, code: &str) -> DomainResult<()> {
        actor.require(Capability::ManageInventory)?;
        let _guard = self.locks.acquire(code).await;

        self.get_room(code).await?;
        let references = self.repos.reservations().count_for_room(code).await?;
        if references > 0 {
            return Err(DomainError::Validation(format!(
                "room {} is referenced by {} reservation(s)",
                code, references
            )));
        }
        self.repos.rooms().delete(code).await?;
        info!(room_code = code, "Room retired");
        Ok(())
    }
}
