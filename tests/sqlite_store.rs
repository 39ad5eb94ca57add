//! SeaORM store against an in-memory SQLite database with migrations applied.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use hotel_core::application::{
    create_event_bus, BookingPolicy, NewReservation, ReceivableLedger, ReservationLifecycle,
    ReservationQueries, RoomLocks, RoomRegistry,
};
use hotel_core::domain::reservation::ReservationQuery;
use hotel_core::domain::room::RoomFilter;
use hotel_core::domain::{
    AuditAction, Change, Changeset, DomainError, Guest, Principal, ReceivableStatus,
    RepositoryProvider, ReservationKind, ReservationStatus, Role, Room, RoomState, RoomType,
};
use hotel_core::shared::pagination::PaginationParams;
use hotel_core::{connect_and_migrate, DatabaseConfig, SeaOrmRepositoryProvider};

async fn provider() -> Arc<SeaOrmRepositoryProvider> {
    let db = connect_and_migrate(&DatabaseConfig::in_memory()).await.unwrap();
    let repos = Arc::new(SeaOrmRepositoryProvider::new(db));

    let suite = repos
        .rooms()
        .save_type(RoomType {
            id: 0,
            name: "Suite".into(),
            description: Some("Two rooms, sea view".into()),
            max_capacity: 4,
            base_price: Decimal::new(18050, 2),
        })
        .await
        .unwrap();
    for (code, floor) in [("S1", 3), ("S2", 4)] {
        repos
            .commit(Changeset::new().with_room(Change::Insert(Room::new(code, code, floor, suite.clone()))))
            .await
            .unwrap();
    }
    let mut regular = Guest::new("12345678", "Ana", "Quispe");
    regular.email = Some("ana@example.com".into());
    regular.visit_count = 5;
    repos.guests().save(regular).await.unwrap();
    repos
}

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 12, d, 14, 0, 0).unwrap()
}

fn stay(room: &str, from: u32, to: u32) -> NewReservation {
    NewReservation {
        guest_id: "12345678".into(),
        room_code: room.into(),
        kind: ReservationKind::InPerson,
        checkin: day(from),
        checkout: day(to),
        guest_count: 3,
        staff_id: Some("recep-1".into()),
        notes: Some("late arrival".into()),
    }
}

fn staff() -> Principal {
    Principal::new("recep-1", Role::Receptionist)
}

#[tokio::test]
async fn room_types_and_rooms_round_trip() {
    let repos = provider().await;

    let room = repos.rooms().find_by_code("S1").await.unwrap().unwrap();
    assert_eq!(room.room_type.name, "Suite");
    assert_eq!(room.current_price, Decimal::new(18050, 2));
    assert_eq!(room.state, RoomState::Available);

    let upper = repos
        .rooms()
        .list(&RoomFilter {
            floor: Some(4),
            min_capacity: Some(2),
            ..RoomFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(upper.len(), 1);
    assert_eq!(upper[0].code, "S2");

    let duplicate = repos
        .rooms()
        .save_type(RoomType {
            id: 0,
            name: "Suite".into(),
            description: None,
            max_capacity: 2,
            base_price: Decimal::ONE,
        })
        .await;
    assert!(matches!(duplicate, Err(DomainError::Validation(_))));
}

#[tokio::test]
async fn lifecycle_persists_every_row_of_a_commit() {
    let repos = provider().await;
    let lifecycle = ReservationLifecycle::new(repos.clone(), create_event_bus(), BookingPolicy::strict());

    let created = lifecycle.create(&staff(), stay("S1", 10, 13)).await.unwrap();
    assert!(created.id > 0);
    // Five visits earn the 10% tier.
    assert_eq!(created.discount, Decimal::new(5415, 2));

    let receivable = repos.receivables().find_by_reservation(created.id).await.unwrap().unwrap();
    assert_eq!(receivable.status, ReceivableStatus::Pending);
    assert_eq!(receivable.total, created.total());

    lifecycle.confirm(&staff(), created.id).await.unwrap();
    lifecycle.check_in(&staff(), created.id).await.unwrap();

    let stored = repos.reservations().find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ReservationStatus::CheckedIn);
    assert!(stored.actual_checkin.is_some());
    assert_eq!(stored.notes.as_deref(), Some("late arrival"));
    assert_eq!(
        repos.rooms().find_by_code("S1").await.unwrap().unwrap().state,
        RoomState::Occupied
    );

    let trail = repos.audit().list_for_reservation(created.id).await.unwrap();
    let actions: Vec<_> = trail.iter().map(|e| e.action).collect();
    assert_eq!(actions, [AuditAction::Create, AuditAction::Confirm, AuditAction::CheckIn]);
    assert_eq!(trail[0].current["room_code"], "S1");
}

#[tokio::test]
async fn overlap_queries_respect_half_open_windows() {
    let repos = provider().await;
    let lifecycle = ReservationLifecycle::new(repos.clone(), create_event_bus(), BookingPolicy::strict());
    let first = lifecycle.create(&staff(), stay("S1", 10, 12)).await.unwrap();

    assert!(!lifecycle.find_overlap("S1", day(12), day(14), None).await.unwrap());
    assert!(lifecycle.find_overlap("S1", day(11), day(12), None).await.unwrap());
    assert!(!lifecycle.find_overlap("S1", day(11), day(12), Some(first.id)).await.unwrap());

    let err = lifecycle.create(&staff(), stay("S1", 11, 14)).await.unwrap_err();
    assert!(matches!(err, DomainError::OverlapConflict { conflicting_id, .. } if conflicting_id == first.id));
}

#[tokio::test]
async fn failed_secondary_write_rolls_back_the_transaction() {
    let repos = provider().await;
    let lifecycle = ReservationLifecycle::new(repos.clone(), create_event_bus(), BookingPolicy::strict());
    let created = lifecycle.create(&staff(), stay("S1", 10, 12)).await.unwrap();

    let mut confirmed = created.clone();
    confirmed.confirm().unwrap();
    let mut ghost = repos.rooms().find_by_code("S1").await.unwrap().unwrap();
    ghost.code = "ZZ".into();

    let err = repos
        .commit(
            Changeset::new()
                .with_reservation(Change::Update(confirmed))
                .with_room(Change::Update(ghost)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::CascadeFailure { operation: "reservation", .. }));

    let stored = repos.reservations().find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ReservationStatus::Pending);
}

#[tokio::test]
async fn payment_reference_and_sweep_use_the_store() {
    let repos = provider().await;
    let bus = create_event_bus();
    let locks = RoomLocks::new();
    let lifecycle = ReservationLifecycle::new(repos.clone(), bus.clone(), BookingPolicy::strict())
        .with_locks(locks.clone());
    let ledger = ReceivableLedger::new(repos.clone(), bus, locks, 3);

    let paid = lifecycle.create(&staff(), stay("S1", 10, 12)).await.unwrap();
    let unpaid = lifecycle.create(&staff(), stay("S2", 10, 12)).await.unwrap();

    let receivable = repos.receivables().find_by_reservation(paid.id).await.unwrap().unwrap();
    ledger.attach_payment_reference(&receivable.id, "pi_123").await.unwrap();
    let settled = ledger.settle_by_reference("pi_123", true).await.unwrap();
    assert_eq!(settled.status, ReceivableStatus::Paid);
    assert_eq!(
        repos.rooms().find_by_code("S1").await.unwrap().unwrap().state,
        RoomState::Occupied
    );
    assert_eq!(
        repos.guests().find_by_id("12345678").await.unwrap().unwrap().visit_count,
        6
    );

    let later = Utc::now().date_naive() + Duration::days(30);
    assert_eq!(ledger.sweep_overdue(later).await.unwrap(), 1);
    let overdue = repos.receivables().find_by_reservation(unpaid.id).await.unwrap().unwrap();
    assert_eq!(overdue.status, ReceivableStatus::Overdue);
    assert_eq!(
        repos.reservations().find_by_id(unpaid.id).await.unwrap().unwrap().status,
        ReservationStatus::Cancelled
    );
}

#[tokio::test]
async fn visit_counter_adds_up_across_rooms() {
    let repos = provider().await;
    let bus = create_event_bus();
    let locks = RoomLocks::new();
    let lifecycle = ReservationLifecycle::new(repos.clone(), bus.clone(), BookingPolicy::strict())
        .with_locks(locks.clone());
    let ledger = Arc::new(ReceivableLedger::new(repos.clone(), bus, locks, 3));

    let mut ids = Vec::new();
    for room in ["S1", "S2"] {
        let r = lifecycle.create(&staff(), stay(room, 10, 12)).await.unwrap();
        ids.push(repos.receivables().find_by_reservation(r.id).await.unwrap().unwrap().id);
    }
    let (a, b) = tokio::join!(ledger.settle(&ids[0], true), ledger.settle(&ids[1], true));
    a.unwrap();
    b.unwrap();

    let guest = repos.guests().find_by_id("12345678").await.unwrap().unwrap();
    assert_eq!(guest.visit_count, 7);
}

#[tokio::test]
async fn queries_join_room_state() {
    let repos = provider().await;
    let lifecycle = ReservationLifecycle::new(repos.clone(), create_event_bus(), BookingPolicy::strict());
    let queries = ReservationQueries::new(repos.clone());

    let in_house = lifecycle.create(&staff(), stay("S1", 10, 12)).await.unwrap();
    lifecycle.confirm(&staff(), in_house.id).await.unwrap();
    lifecycle.check_in(&staff(), in_house.id).await.unwrap();
    let waiting = lifecycle.create(&staff(), stay("S2", 10, 12)).await.unwrap();
    lifecycle.confirm(&staff(), waiting.id).await.unwrap();

    let page = queries
        .reservations_by_status(
            &staff(),
            &[ReservationStatus::CheckedIn, ReservationStatus::Confirmed],
            &[RoomState::Occupied],
            PaginationParams::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, in_house.id);

    let history = repos
        .reservations()
        .query(&ReservationQuery::for_guest("12345678"))
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, waiting.id);

    let second_page = queries
        .reservations_for_guest(&staff(), "12345678", PaginationParams::new(Some(2), Some(1)))
        .await
        .unwrap();
    assert_eq!(second_page.total, 2);
    assert_eq!(second_page.total_pages, 2);
    assert_eq!(second_page.items.len(), 1);
    assert_eq!(second_page.items[0].id, in_house.id);
}

#[tokio::test]
async fn referenced_rooms_cannot_be_retired() {
    let repos = provider().await;
    let bus = create_event_bus();
    let locks = RoomLocks::new();
    let lifecycle = ReservationLifecycle::new(repos.clone(), bus.clone(), BookingPolicy::strict())
        .with_locks(locks.clone());
    let registry = RoomRegistry::new(repos.clone(), bus, locks);
    let admin = Principal::new("admin", Role::Admin);

    lifecycle.create(&staff(), stay("S1", 10, 12)).await.unwrap();
    assert!(registry.retire_room(&admin, "S1").await.is_err());

    registry.retire_room(&admin, "S2").await.unwrap();
    assert!(repos.rooms().find_by_code("S2").await.unwrap().is_none());
}
