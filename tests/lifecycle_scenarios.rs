//! End-to-end reservation scenarios against the in-memory store.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use hotel_core::application::{
    create_event_bus, BookingPolicy, NewReservation, ReceivableLedger, ReservationLifecycle,
    RoomLocks,
};
use hotel_core::domain::reservation::discount_percent;
use hotel_core::domain::{
    Change, Changeset, DomainError, Guest, ReceivableStatus, RepositoryProvider, ReservationKind,
    ReservationStatus, Principal, Role, Room, RoomState, RoomType,
};
use hotel_core::infrastructure::InMemoryStore;

struct Hotel {
    store: Arc<InMemoryStore>,
    lifecycle: ReservationLifecycle,
    ledger: ReceivableLedger,
}

async fn hotel(policy: BookingPolicy) -> Hotel {
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
    store.guests().save(Guest::new("12345678", "Ana", "Quispe")).await.unwrap();
    store.guests().save(Guest::new("87654321", "Luis", "Mamani")).await.unwrap();

    let bus = create_event_bus();
    let locks = RoomLocks::new();
    let lifecycle = ReservationLifecycle::new(store.clone(), bus.clone(), policy.clone())
        .with_locks(locks.clone());
    let ledger = ReceivableLedger::new(store.clone(), bus, locks, policy.payment_grace_days);
    Hotel {
        store,
        lifecycle,
        ledger,
    }
}

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 11, d, 14, 0, 0).unwrap()
}

fn stay(guest: &str, from: u32, to: u32, guests: i32) -> NewReservation {
    NewReservation {
        guest_id: guest.into(),
        room_code: "A1".into(),
        kind: ReservationKind::Online,
        checkin: day(from),
        checkout: day(to),
        guest_count: guests,
        staff_id: None,
        notes: None,
    }
}

fn staff() -> Principal {
    Principal::new("recep-1", Role::Receptionist)
}

async fn room_state(store: &InMemoryStore) -> RoomState {
    store.rooms().find_by_code("A1").await.unwrap().unwrap().state
}

#[tokio::test]
async fn two_night_stay_is_quoted_and_pending() {
    let h = hotel(BookingPolicy::strict()).await;
    let reservation = h.lifecycle.create(&staff(), stay("12345678", 10, 12, 2)).await.unwrap();

    assert_eq!(reservation.nights(), 2);
    assert_eq!(reservation.subtotal(), Decimal::new(200, 0));
    assert_eq!(reservation.discount, Decimal::ZERO);
    assert_eq!(reservation.total(), Decimal::new(200, 0));
    assert_eq!(reservation.status, ReservationStatus::Pending);
    assert_eq!(room_state(&h.store).await, RoomState::Available);
}

#[tokio::test]
async fn tentative_hold_loses_to_confirmed_booking() {
    let h = hotel(BookingPolicy::tentative_holds()).await;
    let first = h.lifecycle.create(&staff(), stay("12345678", 10, 12, 2)).await.unwrap();
    h.lifecycle.confirm(&staff(), first.id).await.unwrap();
    assert_eq!(room_state(&h.store).await, RoomState::Reserved);

    let second = h.lifecycle.create(&staff(), stay("87654321", 11, 13, 1)).await.unwrap();
    assert_eq!(second.status, ReservationStatus::Pending);

    let err = h.lifecycle.confirm(&staff(), second.id).await.unwrap_err();
    assert!(matches!(
        err,
        DomainError::OverlapConflict { conflicting_id, .. } if conflicting_id == first.id
    ));

    let reloaded = h.store.reservations().find_by_id(second.id).await.unwrap().unwrap();
    assert_eq!(reloaded.status, ReservationStatus::Pending);
    assert_eq!(room_state(&h.store).await, RoomState::Reserved);
}

#[tokio::test]
async fn full_stay_cycles_the_room() {
    let h = hotel(BookingPolicy::strict()).await;
    let r = h.lifecycle.create(&staff(), stay("12345678", 10, 12, 2)).await.unwrap();
    h.lifecycle.confirm(&staff(), r.id).await.unwrap();

    h.lifecycle.check_in(&staff(), r.id).await.unwrap();
    assert_eq!(room_state(&h.store).await, RoomState::Occupied);

    let finalized = h.lifecycle.check_out(&staff(), r.id).await.unwrap();
    assert_eq!(finalized.status, ReservationStatus::Finalized);
    assert_eq!(room_state(&h.store).await, RoomState::Cleaning);

    h.lifecycle.finish_cleaning(&staff(), "A1").await.unwrap();
    assert_eq!(room_state(&h.store).await, RoomState::Available);
}

#[tokio::test]
async fn check_out_without_check_in_leaves_room_reserved() {
    let h = hotel(BookingPolicy::strict()).await;
    let r = h.lifecycle.create(&staff(), stay("12345678", 10, 12, 2)).await.unwrap();
    h.lifecycle.confirm(&staff(), r.id).await.unwrap();

    let err = h.lifecycle.check_out(&staff(), r.id).await.unwrap_err();
    assert!(matches!(err, DomainError::NoCheckinRecorded { .. }));
    assert_eq!(room_state(&h.store).await, RoomState::Reserved);
}

#[tokio::test]
async fn duplicate_payment_settles_once() {
    let h = hotel(BookingPolicy::strict()).await;
    let r = h.lifecycle.create(&staff(), stay("12345678", 10, 12, 2)).await.unwrap();
    let receivable = h.store.receivables().find_by_reservation(r.id).await.unwrap().unwrap();

    h.ledger.settle(&receivable.id, true).await.unwrap();
    let again = h.ledger.settle(&receivable.id, true).await.unwrap();
    assert_eq!(again.status, ReceivableStatus::Paid);

    let reservation = h.store.reservations().find_by_id(r.id).await.unwrap().unwrap();
    assert_eq!(reservation.status, ReservationStatus::Confirmed);
    assert_eq!(room_state(&h.store).await, RoomState::Occupied);

    let guest = h.store.guests().find_by_id("12345678").await.unwrap().unwrap();
    assert_eq!(guest.visit_count, 1);

    let arrived = h.lifecycle.check_in(&staff(), r.id).await.unwrap();
    assert_eq!(arrived.status, ReservationStatus::CheckedIn);
    assert_eq!(room_state(&h.store).await, RoomState::Occupied);
}

#[tokio::test]
async fn active_reservations_never_overlap_under_strict_policy() {
    let h = hotel(BookingPolicy::strict()).await;
    h.lifecycle.create(&staff(), stay("12345678", 10, 12, 1)).await.unwrap();
    assert!(h.lifecycle.create(&staff(), stay("87654321", 11, 14, 1)).await.is_err());
    h.lifecycle.create(&staff(), stay("87654321", 12, 14, 1)).await.unwrap();

    let active = h
        .store
        .reservations()
        .find_overlapping(
            "A1",
            &hotel_core::domain::StayWindow::new(day(1), day(28)).unwrap(),
            &ReservationStatus::ACTIVE,
            None,
        )
        .await
        .unwrap();
    assert_eq!(active.len(), 2);
    assert!(!active[0].window.overlaps(&active[1].window));
}

#[test]
fn discount_is_monotonic_in_visits() {
    assert_eq!(discount_percent(0), Decimal::ZERO);
    let mut previous = Decimal::ZERO;
    for visits in 0..40 {
        let current = discount_percent(visits);
        assert!(current >= previous);
        previous = current;
    }
}
