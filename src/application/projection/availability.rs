//! Read model of room availability for dashboards
//!
//! Kept current by applying committed `RoomStateChanged` events, and rebuilt
//! from the store on start, on subscriber lag and on a fixed interval so
//! readers see every change within one refresh period.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::time::Duration;
use tracing::{debug, info, warn};

use crate::application::events::{Event, EventMessage, SharedEventBus};
use crate::domain::room::RoomFilter;
use crate::domain::{DomainResult, RepositoryProvider, Room, RoomState};
use crate::shared::shutdown::ShutdownSignal;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomView {
    pub code: String,
    pub number: String,
    pub floor: i32,
    pub room_type: String,
    pub max_capacity: i32,
    pub state: RoomState,
    pub price: Decimal,
}

impl From<&Room> for RoomView {
    fn from(room: &Room) -> Self {
        Self {
            code: room.code.clone(),
            number: room.number.clone(),
            floor: room.floor,
            room_type: room.room_type.name.clone(),
            max_capacity: room.room_type.max_capacity,
            state: room.state,
            price: room.current_price,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub generated_at: DateTime<Utc>,
    /// Last full rebuild from the store
    pub refreshed_at: Option<DateTime<Utc>>,
    pub total: usize,
    pub available: usize,
    pub reserved: usize,
    pub occupied: usize,
    pub cleaning: usize,
    pub maintenance: usize,
    /// Occupied rooms as a share of all rooms, two decimals
    pub occupancy_percent: f64,
    pub available_rooms: Vec<RoomView>,
}

#[derive(Default)]
pub struct AvailabilityProjection {
    rooms: DashMap<String, RoomView>,
    refreshed_at: RwLock<Option<DateTime<Utc>>>,
}

impl AvailabilityProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the view with the store's current rooms.
    pub async fn rebuild(&self, repos: &dyn RepositoryProvider) -> DomainResult<usize> {
        let rooms = repos.rooms().list(&RoomFilter::default()).await?;
        // Upsert first, then drop retired rooms, so readers never see an empty view.
        let current: HashSet<&str> = rooms.iter().map(|r| r.code.as_str()).collect();
        for room in &rooms {
            self.rooms.insert(room.code.clone(), RoomView::from(room));
        }
        self.rooms.retain(|code, _| current.contains(code.as_str()));
        if let Ok(mut at) = self.refreshed_at.write() {
            *at = Some(Utc::now());
        }
        self.publish_gauge();
        debug!(rooms = rooms.len(), "Availability projection rebuilt");
        Ok(rooms.len())
    }

    /// Fold one committed event into the view. Returns `false` when the
    /// event refers to a room the view does not know, so a rebuild is due.
    pub fn apply(&self, message: &EventMessage) -> bool {
        match &message.event {
            Event::RoomStateChanged(e) => match self.rooms.get_mut(&e.room_code) {
                Some(mut view) => {
                    view.state = e.new_state;
                    drop(view);
                    self.publish_gauge();
                    true
                }
                None => false,
            },
            _ => true,
        }
    }

    fn publish_gauge(&self) {
        let available = self.rooms.iter().filter(|r| r.state == RoomState::Available).count();
        metrics::gauge!("hotel_rooms_available").set(available as f64);
    }

    pub fn room(&self, code: &str) -> Option<RoomView> {
        self.rooms.get(code).map(|r| r.value().clone())
    }

    /// Available rooms ordered by code
    pub fn available_rooms(&self) -> Vec<RoomView> {
        let mut rooms: Vec<RoomView> = self
            .rooms
            .iter()
            .filter(|r| r.state == RoomState::Available)
            .map(|r| r.value().clone())
            .collect();
        rooms.sort_by(|a, b| a.code.cmp(&b.code));
        rooms
    }

    pub fn dashboard(&self) -> DashboardSnapshot {
        let count = |state: RoomState| self.rooms.iter().filter(|r| r.state == state).count();
        let total = self.rooms.len();
        let occupied = count(RoomState::Occupied);
        let occupancy_percent = if total == 0 {
            0.0
        } else {
            (occupied as f64 / total as f64 * 10_000.0).round() / 100.0
        };

        DashboardSnapshot {
            generated_at: Utc::now(),
            refreshed_at: self.refreshed_at.read().ok().and_then(|at| *at),
            total,
            available: count(RoomState::Available),
            reserved: count(RoomState::Reserved),
            occupied,
            cleaning: count(RoomState::Cleaning),
            maintenance: count(RoomState::Maintenance),
            occupancy_percent,
            available_rooms: self.available_rooms(),
        }
    }

    /// Keep the view current in the background until shutdown.
    pub fn spawn(
        self: Arc<Self>,
        repos: Arc<dyn RepositoryProvider>,
        bus: SharedEventBus,
        shutdown: ShutdownSignal,
        refresh_interval_secs: u64,
    ) -> tokio::task::JoinHandle<()> {
        let mut subscriber = bus.subscribe();
        tokio::spawn(async move {
            info!(refresh_interval = refresh_interval_secs, "🏨 Availability projection started");
            let mut interval = tokio::time::interval(Duration::from_secs(refresh_interval_secs.max(1)));

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = self.rebuild(repos.as_ref()).await {
                            warn!(error = %e, "Availability projection refresh failed");
                        }
                    }
                    received = subscriber.recv_or_lag() => match received {
                        Some(Ok(message)) => {
                            if !self.apply(&message) {
                                if let Err(e) = self.rebuild(repos.as_ref()).await {
                                    warn!(error = %e, "Availability projection refresh failed");
                                }
                            }
                        }
                        Some(Err(missed)) => {
                            warn!(missed, "Availability projection lagged, rebuilding");
                            if let Err(e) = self.rebuild(repos.as_ref()).await {
                                warn!(error = %e, "Availability projection refresh failed");
                            }
                        }
                        None => break,
                    },
                    _ = shutdown.notified().wait() => {
                        info!("🏨 Availability projection shutting down");
                        break;
                    }
                }
            }

            info!("🏨 Availability projection stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::events::{create_event_bus, RoomStateChangedEvent};
    use crate::domain::{Change, Changeset, RoomType};
    use crate::infrastructure::storage::InMemoryStore;

    async fn store_with_rooms() -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        let single = store
            .rooms()
            .save_type(RoomType {
                id: 0,
                name: "Single".into(),
                description: None,
                max_capacity: 1,
                base_price: Decimal::new(60, 0),
            })
            .await
            .unwrap();
        for code in ["A1", "A2", "A3", "A4"] {
            store
                .commit(Changeset::new().with_room(Change::Insert(Room::new(code, code, 1, single.clone()))))
                .await
                .unwrap();
        }
        store
    }

    fn changed(code: &str, from: RoomState, to: RoomState) -> EventMessage {
        EventMessage::new(Event::RoomStateChanged(RoomStateChangedEvent {
            room_code: code.into(),
            old_state: from,
            new_state: to,
            timestamp: Utc::now(),
        }))
    }

    #[tokio::test]
    async fn events_update_the_dashboard() {
        let store = store_with_rooms().await;
        let projection = AvailabilityProjection::new();
        assert_eq!(projection.rebuild(store.as_ref()).await.unwrap(), 4);

        assert!(projection.apply(&changed("A1", RoomState::Available, RoomState::Reserved)));
        assert!(projection.apply(&changed("A1", RoomState::Reserved, RoomState::Occupied)));

        let snapshot = projection.dashboard();
        assert_eq!(snapshot.total, 4);
        assert_eq!(snapshot.available, 3);
        assert_eq!(snapshot.occupied, 1);
        assert_eq!(snapshot.occupancy_percent, 25.0);
        assert!(snapshot.refreshed_at.is_some());
        assert_eq!(
            snapshot.available_rooms.iter().map(|r| r.code.as_str()).collect::<Vec<_>>(),
            ["A2", "A3", "A4"]
        );
    }

    #[tokio::test]
    async fn rebuild_drops_retired_rooms_only() {
        let store = store_with_rooms().await;
        let projection = AvailabilityProjection::new();
        projection.rebuild(store.as_ref()).await.unwrap();
        projection.apply(&changed("A1", RoomState::Available, RoomState::Maintenance));

        store.rooms().delete("A4").await.unwrap();
        assert_eq!(projection.rebuild(store.as_ref()).await.unwrap(), 3);
        assert!(projection.room("A4").is_none());
        assert_eq!(projection.room("A1").map(|r| r.state), Some(RoomState::Available));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn readers_never_see_an_empty_view_during_rebuild() {
        let store = store_with_rooms().await;
        let projection = Arc::new(AvailabilityProjection::new());
        projection.rebuild(store.as_ref()).await.unwrap();

        let reader = {
            let projection = projection.clone();
            tokio::spawn(async move {
                let mut smallest = usize::MAX;
                for _ in 0..2000 {
                    smallest = smallest.min(projection.dashboard().total);
                    tokio::task::yield_now().await;
                }
                smallest
            })
        };
        for _ in 0..200 {
            projection.rebuild(store.as_ref()).await.unwrap();
        }
        assert_eq!(reader.await.unwrap(), 4);
    }

    #[tokio::test]
    async fn unknown_rooms_request_a_rebuild() {
        let projection = AvailabilityProjection::new();
        assert!(!projection.apply(&changed("Z9", RoomState::Available, RoomState::Maintenance)));
        assert_eq!(projection.dashboard().occupancy_percent, 0.0);
    }

    #[tokio::test]
    async fn background_task_follows_the_bus() {
        let store = store_with_rooms().await;
        let bus = create_event_bus();
        let shutdown = ShutdownSignal::new();
        let projection = Arc::new(AvailabilityProjection::new());
        let handle = projection
            .clone()
            .spawn(store.clone(), bus.clone(), shutdown.clone(), 3600);

        // The first interval tick rebuilds immediately.
        for _ in 0..50 {
            if projection.dashboard().total == 4 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        bus.publish(Event::RoomStateChanged(RoomStateChangedEvent {
            room_code: "A2".into(),
            old_state: RoomState::Available,
            new_state: RoomState::Maintenance,
            timestamp: Utc::now(),
        }));
        for _ in 0..50 {
            if projection.room("A2").map(|r| r.state) == Some(RoomState::Maintenance) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(projection.dashboard().maintenance, 1);

        shutdown.trigger();
        handle.await.unwrap();
    }
}
