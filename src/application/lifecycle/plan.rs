//! Staging area for one atomic lifecycle write and the events it emits

use chrono::Utc;

use crate::application::events::{
    Event, ReceivableStateChangedEvent, ReservationStateChangedEvent, RoomStateChangedEvent,
    SharedEventBus,
};
use crate::domain::{
    AuditEntry, Change, Changeset, CommitReceipt, DomainResult, Receivable,
    RepositoryProvider, Reservation, ReservationStatus, Room, RoomState,
};

#[derive(Default)]
pub(crate) struct Plan {
    changeset: Changeset,
    events: Vec<Event>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reservation(&mut self, change: Change<Reservation>, old: Option<ReservationStatus>) {
        let r = change.value();
        self.events.push(Event::ReservationStateChanged(ReservationStateChangedEvent {
            reservation_id: r.id,
            room_code: r.room_code.clone(),
            old_state: old,
            new_state: r.status,
            timestamp: Utc::now(),
        }));
        self.changeset.reservation = Some(change);
    }

    pub fn room(&mut self, room: Room, old: RoomState) {
        self.events.push(Event::RoomStateChanged(RoomStateChangedEvent {
            room_code: room.code.clone(),
            old_state: old,
            new_state: room.state,
            timestamp: Utc::now(),
        }));
        self.changeset.rooms.push(Change::Update(room));
    }

    pub fn receivable(&mut self, change: Change<Receivable>) {
        let r = change.value();
        self.events.push(Event::ReceivableStateChanged(ReceivableStateChangedEvent {
            receivable_id: r.id.clone(),
            reservation_id: r.reservation_id,
            new_state: r.status,
            timestamp: Utc::now(),
        }));
        self.changeset.receivable = Some(change);
    }

    pub fn guest_visit(&mut self, guest_id: &str) {
        self.changeset.guest_visits.push(guest_id.to_string());
    }

    pub fn audit(&mut self, entry: AuditEntry) {
        self.changeset.audit.push(entry);
    }

    pub fn event(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Commit the changeset, then publish its events with any freshly
    /// assigned reservation id filled in.
    pub async fn commit(
        self,
        repos: &dyn RepositoryProvider,
        bus: &SharedEventBus,
    ) -> DomainResult<CommitReceipt> {
        let Plan { changeset, mut events } = self;
        let receipt = repos.commit(changeset).await?;

        if let Some(id) = receipt.reservation_id {
            for event in &mut events {
                match event {
                    Event::ReservationStateChanged(e) if e.reservation_id == 0 => e.reservation_id = id,
                    Event::ReceivableStateChanged(e) if e.reservation_id == 0 => e.reservation_id = id,
                    _ => {}
                }
            }
        }
        bus.publish_all(events);
        Ok(receipt)
    }
}
