//! In-memory store for development and testing
//!
//! All tables sit behind one lock. A commit is applied to a staged copy and
//! swapped in only when every write succeeded.

#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::domain::audit::AuditRepository;
use crate::domain::guest::GuestRepository;
use crate::domain::receivable::{ReceivableRepository, ReceivableStatus};
use crate::domain::reservation::{ReservationQuery, ReservationRepository, StayWindow};
use crate::domain::room::{RoomFilter, RoomRepository};
use crate::domain::{
    AuditEntry, Change, Changeset, CommitReceipt, DomainError, DomainResult, Guest, Receivable,
    RepositoryProvider, Reservation, ReservationStatus, Room, RoomType,
};
use crate::shared::pagination::{PaginatedResult, PaginationParams};

#[derive(Clone, Default)]
struct Tables {
    room_types: BTreeMap<i32, RoomType>,
    rooms: BTreeMap<String, Room>,
    guests: BTreeMap<String, Guest>,
    reservations: BTreeMap<i32, Reservation>,
    receivables: HashMap<String, Receivable>,
    audit: Vec<AuditEntry>,
    last_room_type_id: i32,
    last_reservation_id: i32,
    last_audit_id: i32,
}

impl Tables {
    /// Apply every write of the changeset, counting completed writes in
    /// `written` so the caller can tell a primary failure from a cascade one.
    fn apply(&mut self, changeset: Changeset, written: &mut usize, fail_after_primary: bool) -> DomainResult<CommitReceipt> {
        let mut receipt = CommitReceipt::default();
        let step = |written: &mut usize| -> DomainResult<()> {
            *written += 1;
            if fail_after_primary && *written == 1 {
                return Err(DomainError::Storage("injected failure after primary write".to_string()));
            }
            Ok(())
        };

        if let Some(change) = changeset.reservation {
            let id = match change {
                Change::Insert(mut reservation) => {
                    self.last_reservation_id += 1;
                    reservation.id = self.last_reservation_id;
                    self.reservations.insert(reservation.id, reservation);
                    self.last_reservation_id
                }
                Change::Update(reservation) => {
                    if !self.reservations.contains_key(&reservation.id) {
                        return Err(DomainError::not_found("Reservation", "id", reservation.id));
                    }
                    let id = reservation.id;
                    self.reservations.insert(id, reservation);
                    id
                }
            };
            receipt.reservation_id = Some(id);
            step(written)?;
        }

        for change in changeset.rooms {
            match change {
                Change::Insert(room) => {
                    if self.rooms.contains_key(&room.code) {
                        return Err(DomainError::Validation(format!("room {} already exists", room.code)));
                    }
                    self.rooms.insert(room.code.clone(), room);
                }
                Change::Update(room) => {
                    if !self.rooms.contains_key(&room.code) {
                        return Err(DomainError::not_found("Room", "code", &room.code));
                    }
                    self.rooms.insert(room.code.clone(), room);
                }
            }
            step(written)?;
        }

        if let Some(change) = changeset.receivable {
            match change {
                Change::Insert(mut receivable) => {
                    if receivable.reservation_id == 0 {
                        receivable.reservation_id = receipt.reservation_id.unwrap_or_default();
                    }
                    if self
                        .receivables
                        .values()
                        .any(|r| r.reservation_id == receivable.reservation_id)
                    {
                        return Err(DomainError::Validation(format!(
                            "reservation {} already has a receivable",
                            receivable.reservation_id
                        )));
                    }
                    self.receivables.insert(receivable.id.clone(), receivable);
                }
                Change::Update(receivable) => {
                    if !self.receivables.contains_key(&receivable.id) {
                        return Err(DomainError::not_found("Receivable", "id", &receivable.id));
                    }
                    self.receivables.insert(receivable.id.clone(), receivable);
                }
            }
            step(written)?;
        }

        for guest_id in changeset.guest_visits {
            let guest = self
                .guests
                .get_mut(&guest_id)
                .ok_or_else(|| DomainError::not_found("Guest", "id", &guest_id))?;
            guest.record_visit();
            step(written)?;
        }

        for mut entry in changeset.audit {
            if entry.reservation_id == Some(0) {
                entry.reservation_id = receipt.reservation_id;
            }
            self.last_audit_id += 1;
            entry.id = self.last_audit_id;
            self.audit.push(entry);
            step(written)?;
        }

        Ok(receipt)
    }
}

pub struct InMemoryStore {
    tables: RwLock<Tables>,
    #[cfg(test)]
    fail_after_primary: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            #[cfg(test)]
            fail_after_primary: AtomicBool::new(false),
        }
    }

    /// Make the next commits fail right after their first write.
    #[cfg(test)]
    pub fn fail_after_primary_write(&self, enabled: bool) {
        self.fail_after_primary.store(enabled, Ordering::SeqCst);
    }

    fn fault_injected(&self) -> bool {
        #[cfg(test)]
        {
            self.fail_after_primary.load(Ordering::SeqCst)
        }
        #[cfg(not(test))]
        {
            false
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RepositoryProvider for InMemoryStore {
    fn rooms(&self) -> &dyn RoomRepository {
        self
    }

    fn reservations(&self) -> &dyn ReservationRepository {
        self
    }

    fn receivables(&self) -> &dyn ReceivableRepository {
        self
    }

    fn guests(&self) -> &dyn GuestRepository {
        self
    }

    fn audit(&self) -> &dyn AuditRepository {
        self
    }

    async fn commit(&self, changeset: Changeset) -> DomainResult<CommitReceipt> {
        if changeset.is_empty() {
            return Ok(CommitReceipt::default());
        }
        let operation = changeset.primary();
        let mut tables = self.tables.write().await;
        let mut staged = tables.clone();
        let mut written = 0;

        match staged.apply(changeset, &mut written, self.fault_injected()) {
            Ok(receipt) => {
                *tables = staged;
                Ok(receipt)
            }
            Err(e) if written == 0 => Err(e),
            Err(e) => Err(DomainError::CascadeFailure {
                operation,
                reason: e.to_string(),
            }),
        }
    }
}

#[async_trait]
impl RoomRepository for InMemoryStore {
    async fn find_by_code(&self, code: &str) -> DomainResult<Option<Room>> {
        Ok(self.tables.read().await.rooms.get(code).cloned())
    }

    async fn list(&self, filter: &RoomFilter) -> DomainResult<Vec<Room>> {
        Ok(self
            .tables
            .read()
            .await
            .rooms
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn delete(&self, code: &str) -> DomainResult<()> {
        self.tables
            .write()
            .await
            .rooms
            .remove(code)
            .map(|_| ())
            .ok_or_else(|| DomainError::not_found("Room", "code", code))
    }

    async fn find_type(&self, id: i32) -> DomainResult<Option<RoomType>> {
        Ok(self.tables.read().await.room_types.get(&id).cloned())
    }

    async fn list_types(&self) -> DomainResult<Vec<RoomType>> {
        Ok(self.tables.read().await.room_types.values().cloned().collect())
    }

    async fn save_type(&self, mut room_type: RoomType) -> DomainResult<RoomType> {
        let mut tables = self.tables.write().await;
        if tables.room_types.values().any(|t| t.name == room_type.name) {
            return Err(DomainError::Validation(format!(
                "room type '{}' already exists",
                room_type.name
            )));
        }
        tables.last_room_type_id += 1;
        room_type.id = tables.last_room_type_id;
        tables.room_types.insert(room_type.id, room_type.clone());
        Ok(room_type)
    }
}

#[async_trait]
impl ReservationRepository for InMemoryStore {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Reservation>> {
        Ok(self.tables.read().await.reservations.get(&id).cloned())
    }

    async fn find_overlapping(
        &self,
        room_code: &str,
        window: &StayWindow,
        statuses: &[ReservationStatus],
        exclude_id: Option<i32>,
    ) -> DomainResult<Vec<Reservation>> {
        let tables = self.tables.read().await;
        let mut found: Vec<Reservation> = tables
            .reservations
            .values()
            .filter(|r| {
                r.room_code == room_code
                    && statuses.contains(&r.status)
                    && Some(r.id) != exclude_id
                    && r.window.overlaps(window)
            })
            .cloned()
            .collect();
        found.sort_by_key(|r| r.window.checkin);
        Ok(found)
    }

    async fn query(&self, query: &ReservationQuery) -> DomainResult<Vec<Reservation>> {
        let tables = self.tables.read().await;
        let mut found: Vec<Reservation> = tables
            .reservations
            .values()
            .filter(|r| query.guest_id.as_ref().map_or(true, |g| &r.guest_id == g))
            .filter(|r| query.room_code.as_ref().map_or(true, |c| &r.room_code == c))
            .filter(|r| query.statuses.is_empty() || query.statuses.contains(&r.status))
            .filter(|r| {
                query.room_states.is_empty()
                    || tables
                        .rooms
                        .get(&r.room_code)
                        .is_some_and(|room| query.room_states.contains(&room.state))
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(found)
    }

    async fn query_page(
        &self,
        query: &ReservationQuery,
        page: PaginationParams,
    ) -> DomainResult<PaginatedResult<Reservation>> {
        let all = ReservationRepository::query(self, query).await?;
        Ok(PaginatedResult::from_vec(all, page))
    }

    async fn count_for_room(&self, room_code: &str) -> DomainResult<u64> {
        Ok(self
            .tables
            .read()
            .await
            .reservations
            .values()
            .filter(|r| r.room_code == room_code)
            .count() as u64)
    }
}

#[async_trait]
impl ReceivableRepository for InMemoryStore {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Receivable>> {
        Ok(self.tables.read().await.receivables.get(id).cloned())
    }

    async fn find_by_reservation(&self, reservation_id: i32) -> DomainResult<Option<Receivable>> {
        Ok(self
            .tables
            .read()
            .await
            .receivables
            .values()
            .find(|r| r.reservation_id == reservation_id)
            .cloned())
    }

    async fn find_by_payment_reference(&self, reference: &str) -> DomainResult<Option<Receivable>> {
        Ok(self
            .tables
            .read()
            .await
            .receivables
            .values()
            .find(|r| r.payment_reference.as_deref() == Some(reference))
            .cloned())
    }

    async fn find_past_due(&self, today: NaiveDate) -> DomainResult<Vec<Receivable>> {
        let tables = self.tables.read().await;
        let mut due: Vec<Receivable> = tables
            .receivables
            .values()
            .filter(|r| r.status == ReceivableStatus::Pending && r.due_date < today)
            .cloned()
            .collect();
        due.sort_by_key(|r| r.due_date);
        Ok(due)
    }
}

#[async_trait]
impl GuestRepository for InMemoryStore {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Guest>> {
        Ok(self.tables.read().await.guests.get(id).cloned())
    }

    async fn save(&self, guest: Guest) -> DomainResult<()> {
        let mut tables = self.tables.write().await;
        if tables.guests.contains_key(&guest.id) {
            return Err(DomainError::Validation(format!("guest {} already exists", guest.id)));
        }
        tables.guests.insert(guest.id.clone(), guest);
        Ok(())
    }

    async fn list(&self) -> DomainResult<Vec<Guest>> {
        Ok(self.tables.read().await.guests.values().cloned().collect())
    }
}

#[async_trait]
impl AuditRepository for InMemoryStore {
    async fn list_for_reservation(&self, reservation_id: i32) -> DomainResult<Vec<AuditEntry>> {
        Ok(self
            .tables
            .read()
            .await
            .audit
            .iter()
            .filter(|e| e.reservation_id == Some(reservation_id))
            .cloned()
            .collect())
    }

    async fn list_for_room(&self, room_code: &str) -> DomainResult<Vec<AuditEntry>> {
        Ok(self
            .tables
            .read()
            .await
            .audit
            .iter()
            .filter(|e| e.room_code.as_deref() == Some(room_code))
            .cloned()
            .collect())
    }
}
