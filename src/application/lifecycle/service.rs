//! Reservation lifecycle service
//!
//! Owns the reservation state machine and drives the room transitions that
//! go with it. Every mutating operation takes the room lock, re-reads the
//! current rows, checks its invariants and commits one changeset.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, info};
use validator::Validate;

use super::cascade::{first_overlap, snapshot, stage_cancel, stage_confirm};
use super::locks::RoomLocks;
use super::plan::Plan;
use super::policy::BookingPolicy;
use crate::application::events::SharedEventBus;
use crate::domain::reservation::{Quote, ReservationQuery, StayWindow};
use crate::domain::{
    AuditAction, AuditEntry, Capability, Change, DomainError, DomainResult, Principal, Receivable,
    ReceivableStatus, RepositoryProvider, Reservation, ReservationKind, ReservationStatus, Role,
    Room, RoomState, TransitionSource,
};

/// Booking request as received from the API layer
#[derive(Debug, Clone, Validate)]
pub struct NewReservation {
    #[validate(length(min = 1, max = 20))]
    pub guest_id: String,
    #[validate(length(min = 1, max = 20))]
    pub room_code: String,
    pub kind: ReservationKind,
    pub checkin: DateTime<Utc>,
    pub checkout: DateTime<Utc>,
    #[validate(range(min = 1, message = "at least one guest is required"))]
    pub guest_count: i32,
    pub staff_id: Option<String>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

pub(crate) fn observe<T>(operation: &'static str, result: DomainResult<T>) -> DomainResult<T> {
    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => {
            debug!(operation, error = %e, "Lifecycle operation rejected");
            e.kind().as_str()
        }
    };
    metrics::counter!("hotel_lifecycle_operations_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
    result
}

pub struct ReservationLifecycle {
    repos: Arc<dyn RepositoryProvider>,
    events: SharedEventBus,
    locks: RoomLocks,
    policy: BookingPolicy,
}

impl ReservationLifecycle {
    pub fn new(repos: Arc<dyn RepositoryProvider>, events: SharedEventBus, policy: BookingPolicy) -> Self {
        Self {
            repos,
            events,
            locks: RoomLocks::new(),
            policy,
        }
    }

    /// Share a lock registry with other services mutating the same rooms.
    pub fn with_locks(mut self, locks: RoomLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn locks(&self) -> &RoomLocks {
        &self.locks
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    async fn load_reservation(&self, id: i32) -> DomainResult<Reservation> {
        self.repos
            .reservations()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Reservation", "id", id))
    }

    async fn load_room(&self, code: &str) -> DomainResult<Room> {
        self.repos
            .rooms()
            .find_by_code(code)
            .await?
            .ok_or_else(|| DomainError::not_found("Room", "code", code))
    }

    // ── create ──────────────────────────────────────────────────

    pub async fn create(&self, actor: &Principal, request: NewReservation) -> DomainResult<Reservation> {
        observe("create", self.create_inner(actor, request).await)
    }

    async fn create_inner(&self, actor: &Principal, request: NewReservation) -> DomainResult<Reservation> {
        actor.require(Capability::CreateReservation)?;
        if actor.role == Role::Guest && actor.id != request.guest_id {
            return Err(DomainError::Forbidden(format!(
                "guest '{}' cannot book on behalf of '{}'",
                actor.id, request.guest_id
            )));
        }
        request.validate()?;
        let window = StayWindow::new(request.checkin, request.checkout)?;
        if request.kind.requires_presence() && request.staff_id.is_none() {
            return Err(DomainError::Validation(
                "in-person reservations require a staff member".to_string(),
            ));
        }

        let _guard = self.locks.acquire(&request.room_code).await;

        let room = self.load_room(&request.room_code).await?;
        let guest = self
            .repos
            .guests()
            .find_by_id(&request.guest_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Guest", "id", &request.guest_id))?;

        if request.guest_count > room.room_type.max_capacity {
            return Err(DomainError::Validation(format!(
                "{} guests exceed the capacity ({}) of room {}",
                request.guest_count, room.room_type.max_capacity, room.code
            )));
        }
        if room.current_price <= Decimal::ZERO {
            return Err(DomainError::Validation(format!(
                "room {} has no positive nightly price",
                room.code
            )));
        }
        if self.policy.blocks(room.state) {
            return Err(DomainError::Validation(format!(
                "room {} is {} and cannot be booked",
                room.code, room.state
            )));
        }
        if !self.policy.tentative_overlap {
            if let Some(conflict) = first_overlap(
                self.repos.as_ref(),
                &room.code,
                &window,
                &ReservationStatus::ACTIVE,
                None,
            )
            .await?
            {
                return Err(DomainError::OverlapConflict {
                    room_code: room.code.clone(),
                    conflicting_id: conflict.id,
                });
            }
        }

        let quote = Quote::compute(
            &window,
            room.current_price,
            guest.visit_count,
            self.policy.tax_rate_percent,
        );
        let now = Utc::now();
        let mut reservation = Reservation {
            id: 0,
            guest_id: guest.id.clone(),
            staff_id: request.staff_id,
            room_code: room.code.clone(),
            kind: request.kind,
            status: ReservationStatus::Pending,
            window,
            actual_checkin: None,
            actual_checkout: None,
            nightly_price: quote.nightly_price,
            discount: quote.discount,
            taxes: quote.taxes,
            guest_count: request.guest_count,
            notes: request.notes,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        };

        let mut plan = Plan::new();
        plan.reservation(Change::Insert(reservation.clone()), None);
        if self.policy.open_receivable_on_create {
            let due = now.date_naive() + Duration::days(self.policy.payment_grace_days);
            plan.receivable(Change::Insert(Receivable::open(0, &guest.id, quote.total, due)));
        }
        plan.audit(
            AuditEntry::new(&actor.id, AuditAction::Create, format!("Reservation for room {}", room.code))
                .reservation(0)
                .room(&room.code)
                .change(Value::Null, snapshot(&reservation)),
        );

        let receipt = plan.commit(self.repos.as_ref(), &self.events).await?;
        reservation.id = receipt.reservation_id.ok_or_else(|| {
            DomainError::Storage("store did not assign a reservation id".to_string())
        })?;

        info!(
            reservation_id = reservation.id,
            room_code = %reservation.room_code,
            guest_id = %reservation.guest_id,
            nights = quote.nights,
            total = %quote.total,
            "Reservation created"
        );
        Ok(reservation)
    }

    // ── confirm ─────────────────────────────────────────────────

    pub async fn confirm(&self, actor: &Principal, id: i32) -> DomainResult<Reservation> {
        observe("confirm", self.confirm_inner(actor, id).await)
    }

    async fn confirm_inner(&self, actor: &Principal, id: i32) -> DomainResult<Reservation> {
        actor.require(Capability::ConfirmReservation)?;
        let room_code = self.load_reservation(id).await?.room_code;
        let _guard = self.locks.acquire(&room_code).await;

        let mut reservation = self.load_reservation(id).await?;
        let mut room = self.load_room(&room_code).await?;
        let before = snapshot(&reservation);

        let room_before = stage_confirm(self.repos.as_ref(), &mut reservation, &mut room).await?;

        let mut plan = Plan::new();
        plan.reservation(Change::Update(reservation.clone()), Some(ReservationStatus::Pending));
        plan.room(room, room_before);
        plan.audit(
            AuditEntry::new(&actor.id, AuditAction::Confirm, "Reservation confirmed")
                .reservation(id)
                .room(&room_code)
                .change(before, snapshot(&reservation)),
        );
        plan.commit(self.repos.as_ref(), &self.events).await?;

        info!(reservation_id = id, room_code = %room_code, actor = %actor.id, "Reservation confirmed");
        Ok(reservation)
    }

    // ── cancel ──────────────────────────────────────────────────

    pub async fn cancel(&self, actor: &Principal, id: i32, reason: Option<String>) -> DomainResult<Reservation> {
        observe("cancel", self.cancel_inner(actor, id, reason).await)
    }

    async fn cancel_inner(&self, actor: &Principal, id: i32, reason: Option<String>) -> DomainResult<Reservation> {
        let room_code = {
            let reservation = self.load_reservation(id).await?;
            if reservation.guest_id == actor.id {
                actor.require(Capability::CancelOwnReservation)?;
            } else {
                actor.require(Capability::CancelAnyReservation)?;
            }
            reservation.room_code
        };
        let _guard = self.locks.acquire(&room_code).await;

        let mut reservation = self.load_reservation(id).await?;
        let mut room = self.load_room(&room_code).await?;
        let before = snapshot(&reservation);
        let previous_status = reservation.status;

        let room_before = stage_cancel(&mut reservation, &mut room, reason)?;

        let mut plan = Plan::new();
        plan.reservation(Change::Update(reservation.clone()), Some(previous_status));
        if let Some(old) = room_before {
            plan.room(room, old);
        }
        if let Some(mut receivable) = self.repos.receivables().find_by_reservation(id).await? {
            if receivable.void() {
                plan.receivable(Change::Update(receivable));
            }
        }
        plan.audit(
            AuditEntry::new(&actor.id, AuditAction::Cancel, "Reservation cancelled")
                .reservation(id)
                .room(&room_code)
                .change(before, snapshot(&reservation)),
        );
        plan.commit(self.repos.as_ref(), &self.events).await?;

        info!(
            reservation_id = id,
            room_code = %room_code,
            from = %previous_status,
            released = room_before.is_some(),
            "Reservation cancelled"
        );
        Ok(reservation)
    }

    // ── check-in / check-out ────────────────────────────────────

    pub async fn check_in(&self, actor: &Principal, id: i32) -> DomainResult<Reservation> {
        observe("check_in", self.check_in_inner(actor, id).await)
    }

    async fn check_in_inner(&self, actor: &Principal, id: i32) -> DomainResult<Reservation> {
        actor.require(Capability::CheckIn)?;
        let room_code = self.load_reservation(id).await?.room_code;
        let _guard = self.locks.acquire(&room_code).await;

        let mut reservation = self.load_reservation(id).await?;
        let mut room = self.load_room(&room_code).await?;
        let before = snapshot(&reservation);

        reservation.check_in(Utc::now())?;
        let room_before = if room.state == RoomState::Occupied {
            self.ensure_occupied_by_payment(&reservation).await?;
            None
        } else {
            Some(room.transition(RoomState::Occupied, TransitionSource::Lifecycle)?)
        };

        let mut plan = Plan::new();
        plan.reservation(Change::Update(reservation.clone()), Some(ReservationStatus::Confirmed));
        if let Some(old) = room_before {
            plan.room(room, old);
        }
        plan.audit(
            AuditEntry::new(&actor.id, AuditAction::CheckIn, "Guest checked in")
                .reservation(id)
                .room(&room_code)
                .change(before, snapshot(&reservation)),
        );
        plan.commit(self.repos.as_ref(), &self.events).await?;

        info!(reservation_id = id, room_code = %room_code, "Guest checked in");
        Ok(reservation)
    }

    /// A paid reservation finds its room already Occupied. Any other
    /// occupant still checked in means the room is not this guest's yet.
    async fn ensure_occupied_by_payment(&self, reservation: &Reservation) -> DomainResult<()> {
        let paid = self
            .repos
            .receivables()
            .find_by_reservation(reservation.id)
            .await?
            .is_some_and(|r| r.status == ReceivableStatus::Paid);
        let in_house = ReservationQuery {
            room_code: Some(reservation.room_code.clone()),
            ..ReservationQuery::default()
        }
        .with_statuses(&[ReservationStatus::CheckedIn]);
        let occupied_by_other = self
            .repos
            .reservations()
            .query(&in_house)
            .await?
            .iter()
            .any(|r| r.id != reservation.id);

        if paid && !occupied_by_other {
            return Ok(());
        }
        Err(DomainError::InvalidTransition {
            entity: "Room",
            id: reservation.room_code.clone(),
            from: RoomState::Occupied.to_string(),
            to: RoomState::Occupied.to_string(),
        })
    }

    pub async fn check_out(&self, actor: &Principal, id: i32) -> DomainResult<Reservation> {
        observe("check_out", self.check_out_inner(actor, id).await)
    }

    async fn check_out_inner(&self, actor: &Principal, id: i32) -> DomainResult<Reservation> {
        actor.require(Capability::CheckOut)?;
        let room_code = self.load_reservation(id).await?.room_code;
        let _guard = self.locks.acquire(&room_code).await;

        let mut reservation = self.load_reservation(id).await?;
        let mut room = self.load_room(&room_code).await?;
        let before = snapshot(&reservation);

        reservation.check_out(Utc::now())?;
        let room_before = room.transition(RoomState::Cleaning, TransitionSource::Lifecycle)?;

        let mut plan = Plan::new();
        plan.reservation(Change::Update(reservation.clone()), Some(ReservationStatus::CheckedIn));
        plan.room(room, room_before);
        plan.audit(
            AuditEntry::new(&actor.id, AuditAction::CheckOut, "Guest checked out")
                .reservation(id)
                .room(&room_code)
                .change(before, snapshot(&reservation)),
        );
        plan.commit(self.repos.as_ref(), &self.events).await?;

        info!(reservation_id = id, room_code = %room_code, "Guest checked out");
        Ok(reservation)
    }

    // ── housekeeping ────────────────────────────────────────────

    /// Cleaning -> Available, recording the cleaning time.
    pub async fn finish_cleaning(&self, actor: &Principal, room_code: &str) -> DomainResult<Room> {
        observe("finish_cleaning", self.finish_cleaning_inner(actor, room_code).await)
    }

    async fn finish_cleaning_inner(&self, actor: &Principal, room_code: &str) -> DomainResult<Room> {
        actor.require(Capability::FinishCleaning)?;
        let _guard = self.locks.acquire(room_code).await;

        let mut room = self.load_room(room_code).await?;
        if room.state != RoomState::Cleaning {
            return Err(DomainError::InvalidTransition {
                entity: "Room",
                id: room.code.clone(),
                from: room.state.to_string(),
                to: RoomState::Available.to_string(),
            });
        }
        let previous = room.transition(RoomState::Available, TransitionSource::Lifecycle)?;

        let mut plan = Plan::new();
        plan.audit(
            AuditEntry::new(&actor.id, AuditAction::FinishCleaning, "Cleaning finished")
                .room(room_code)
                .change(
                    serde_json::json!({ "state": previous }),
                    serde_json::json!({ "state": room.state, "last_cleaned_at": room.last_cleaned_at }),
                ),
        );
        plan.room(room.clone(), previous);
        plan.commit(self.repos.as_ref(), &self.events).await?;

        info!(room_code, "Room cleaned and available");
        Ok(room)
    }

    // ── queries ─────────────────────────────────────────────────

    /// Whether an active reservation other than `exclude_id` overlaps the window.
    pub async fn find_overlap(
        &self,
        room_code: &str,
        checkin: DateTime<Utc>,
        checkout: DateTime<Utc>,
        exclude_id: Option<i32>,
    ) -> DomainResult<bool> {
        let window = StayWindow::new(checkin, checkout)?;
        Ok(first_overlap(
            self.repos.as_ref(),
            room_code,
            &window,
            &ReservationStatus::ACTIVE,
            exclude_id,
        )
        .await?
        .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::{create_event_bus, Event};
    use crate::domain::{Changeset, ErrorKind, Guest, ReceivableStatus, RoomType};
    use crate::infrastructure::storage::InMemoryStore;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, d, 14, 0, 0).unwrap()
    }

    fn staff() -> Principal {
        Principal::new("recep-1", Role::Receptionist)
    }

    async fn setup(policy: BookingPolicy) -> (Arc<InMemoryStore>, ReservationLifecycle, SharedEventBus) {
        let store = Arc::new(InMemoryStore::new());
        let double = store
            .rooms()
            .save_type(RoomType {
                id: 0,
                name: "Double".into(),
                description: None,
                max_capacity: 2,
                base_price: Decimal::new(100, 0),
            })
            .await
            .unwrap();
        store
            .commit(Changeset::new().with_room(Change::Insert(Room::new("A1", "101", 1, double))))
            .await
            .unwrap();
        store
            .guests()
            .save(Guest::new("12345678", "Ana", "Quispe"))
            .await
            .unwrap();
        let bus = create_event_bus();
        let lifecycle = ReservationLifecycle::new(store.clone(), bus.clone(), policy);
        (store, lifecycle, bus)
    }

    fn request(checkin: u32, checkout: u32) -> NewReservation {
        NewReservation {
            guest_id: "12345678".into(),
            room_code: "A1".into(),
            kind: ReservationKind::Online,
            checkin: day(checkin),
            checkout: day(checkout),
            guest_count: 2,
            staff_id: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn create_prices_the_stay_and_opens_a_receivable() {
        let (store, lifecycle, _) = setup(BookingPolicy::strict()).await;
        let r = lifecycle.create(&staff(), request(1, 3)).await.unwrap();

        assert_eq!(r.status, ReservationStatus::Pending);
        assert_eq!(r.nights(), 2);
        assert_eq!(r.subtotal(), Decimal::new(200, 0));
        assert_eq!(r.total(), Decimal::new(200, 0));

        let receivable = store.receivables().find_by_reservation(r.id).await.unwrap().unwrap();
        assert_eq!(receivable.status, ReceivableStatus::Pending);
        assert_eq!(receivable.balance(), r.total());

        let room = store.rooms().find_by_code("A1").await.unwrap().unwrap();
        assert_eq!(room.state, RoomState::Available);
    }

    #[tokio::test]
    async fn create_rejects_bad_input() {
        let (_, lifecycle, _) = setup(BookingPolicy::strict()).await;

        let mut too_many = request(1, 3);
        too_many.guest_count = 3;
        let err = lifecycle.create(&staff(), too_many).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = lifecycle.create(&staff(), request(3, 3)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let mut in_person = request(1, 3);
        in_person.kind = ReservationKind::InPerson;
        let err = lifecycle.create(&staff(), in_person).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn guests_cannot_book_for_someone_else() {
        let (_, lifecycle, _) = setup(BookingPolicy::strict()).await;
        let intruder = Principal::new("99999999", Role::Guest);
        let err = lifecycle.create(&intruder, request(1, 3)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn strict_policy_rejects_overlap_at_creation() {
        let (_, lifecycle, _) = setup(BookingPolicy::strict()).await;
        let first = lifecycle.create(&staff(), request(1, 4)).await.unwrap();
        let err = lifecycle.create(&staff(), request(3, 5)).await.unwrap_err();
        assert!(matches!(err, DomainError::OverlapConflict { conflicting_id, .. } if conflicting_id == first.id));

        // Back-to-back stays share no night.
        lifecycle.create(&staff(), request(4, 6)).await.unwrap();
    }

    #[tokio::test]
    async fn confirm_reserves_the_room_and_emits_events() {
        let (store, lifecycle, bus) = setup(BookingPolicy::strict()).await;
        let mut sub = bus.subscribe();
        let r = lifecycle.create(&staff(), request(1, 3)).await.unwrap();
        let confirmed = lifecycle.confirm(&staff(), r.id).await.unwrap();
        assert_eq!(confirmed.status, ReservationStatus::Confirmed);

        let room = store.rooms().find_by_code("A1").await.unwrap().unwrap();
        assert_eq!(room.state, RoomState::Reserved);

        let mut saw_room_event = false;
        while let crate::application::events::TryRecv::Message(msg) = sub.try_recv() {
            if let Event::RoomStateChanged(e) = msg.event {
                assert_eq!(e.new_state, RoomState::Reserved);
                saw_room_event = true;
            }
        }
        assert!(saw_room_event);

        let err = lifecycle.confirm(&staff(), r.id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotPending { .. }));
    }

    #[tokio::test]
    async fn guests_cannot_confirm() {
        let (_, lifecycle, _) = setup(BookingPolicy::strict()).await;
        let guest = Principal::new("12345678", Role::Guest);
        let r = lifecycle.create(&guest, request(1, 3)).await.unwrap();
        let err = lifecycle.confirm(&guest, r.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn cancel_confirmed_releases_room_and_voids_receivable() {
        let (store, lifecycle, _) = setup(BookingPolicy::strict()).await;
        let guest = Principal::new("12345678", Role::Guest);
        let r = lifecycle.create(&guest, request(1, 3)).await.unwrap();
        lifecycle.confirm(&staff(), r.id).await.unwrap();

        let cancelled = lifecycle
            .cancel(&guest, r.id, Some("plans changed".into()))
            .await
            .unwrap();
        assert_eq!(cancelled.status, ReservationStatus::Cancelled);
        assert_eq!(cancelled.cancellation_reason.as_deref(), Some("plans changed"));

        let room = store.rooms().find_by_code("A1").await.unwrap().unwrap();
        assert_eq!(room.state, RoomState::Available);
        let receivable = store.receivables().find_by_reservation(r.id).await.unwrap().unwrap();
        assert_eq!(receivable.status, ReceivableStatus::Cancelled);
    }

    #[tokio::test]
    async fn cancel_after_check_in_is_rejected() {
        let (_, lifecycle, _) = setup(BookingPolicy::strict()).await;
        let r = lifecycle.create(&staff(), request(1, 3)).await.unwrap();
        lifecycle.confirm(&staff(), r.id).await.unwrap();
        lifecycle.check_in(&staff(), r.id).await.unwrap();

        let err = lifecycle.cancel(&staff(), r.id, None).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn check_out_without_check_in_leaves_room_unchanged() {
        let (store, lifecycle, _) = setup(BookingPolicy::strict()).await;
        let r = lifecycle.create(&staff(), request(1, 3)).await.unwrap();
        lifecycle.confirm(&staff(), r.id).await.unwrap();

        let err = lifecycle.check_out(&staff(), r.id).await.unwrap_err();
        assert!(matches!(err, DomainError::NoCheckinRecorded { .. }));
        let room = store.rooms().find_by_code("A1").await.unwrap().unwrap();
        assert_eq!(room.state, RoomState::Reserved);
    }

    #[tokio::test]
    async fn finish_cleaning_requires_cleaning_state() {
        let (_, lifecycle, _) = setup(BookingPolicy::strict()).await;
        let err = lifecycle.finish_cleaning(&staff(), "A1").await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn find_overlap_ignores_excluded_and_finished_reservations() {
        let (_, lifecycle, _) = setup(BookingPolicy::strict()).await;
        let r = lifecycle.create(&staff(), request(1, 3)).await.unwrap();

        assert!(lifecycle.find_overlap("A1", day(2), day(4), None).await.unwrap());
        assert!(!lifecycle.find_overlap("A1", day(2), day(4), Some(r.id)).await.unwrap());

        lifecycle.cancel(&staff(), r.id, None).await.unwrap();
        assert!(!lifecycle.find_overlap("A1", day(2), day(4), None).await.unwrap());
    }

    #[tokio::test]
    async fn failed_cascade_rolls_back_everything() {
        let (store, lifecycle, _) = setup(BookingPolicy::strict()).await;
        let r = lifecycle.create(&staff(), request(1, 3)).await.unwrap();

        store.fail_after_primary_write(true);
        let err = lifecycle.confirm(&staff(), r.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cascade);
        store.fail_after_primary_write(false);

        let reservation = store.reservations().find_by_id(r.id).await.unwrap().unwrap();
        assert_eq!(reservation.status, ReservationStatus::Pending);
        let room = store.rooms().find_by_code("A1").await.unwrap().unwrap();
        assert_eq!(room.state, RoomState::Available);
    }

    #[tokio::test]
    async fn failed_create_leaves_no_reservation_behind() {
        let (store, lifecycle, _) = setup(BookingPolicy::strict()).await;
        store.fail_after_primary_write(true);
        let err = lifecycle.create(&staff(), request(1, 3)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cascade);
        store.fail_after_primary_write(false);

        let all = store
            .reservations()
            .query(&Default::default())
            .await
            .unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn concurrent_confirms_admit_exactly_one() {
        let (store, lifecycle, _) = setup(BookingPolicy::tentative_holds()).await;
        let lifecycle = Arc::new(lifecycle);
        let a = lifecycle.create(&staff(), request(1, 3)).await.unwrap();
        let b = lifecycle.create(&staff(), request(2, 4)).await.unwrap();

        let (ra, rb) = tokio::join!(
            {
                let l = lifecycle.clone();
                async move { l.confirm(&staff(), a.id).await }
            },
            {
                let l = lifecycle.clone();
                async move { l.confirm(&staff(), b.id).await }
            }
        );
        assert_eq!([ra.is_ok(), rb.is_ok()].iter().filter(|ok| **ok).count(), 1);
        let loser = ra.err().or(rb.err()).unwrap();
        assert_eq!(loser.kind(), ErrorKind::Conflict);

        let room = store.rooms().find_by_code("A1").await.unwrap().unwrap();
        assert_eq!(room.state, RoomState::Reserved);
    }
}
