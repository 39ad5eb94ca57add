//! SeaORM implementation of RepositoryProvider

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, TransactionTrait,
};
use tracing::{debug, warn};

use crate::domain::audit::AuditRepository;
use crate::domain::guest::GuestRepository;
use crate::domain::receivable::ReceivableRepository;
use crate::domain::repositories::{Change, Changeset, CommitReceipt, RepositoryProvider};
use crate::domain::reservation::ReservationRepository;
use crate::domain::room::RoomRepository;
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{guest, receivable, reservation, room};

use super::audit_repository::{self, SeaOrmAuditRepository};
use super::guest_repository::SeaOrmGuestRepository;
use super::receivable_repository::{self, SeaOrmReceivableRepository};
use super::reservation_repository::{self, SeaOrmReservationRepository};
use super::room_repository::{self, db_err, SeaOrmRoomRepository};

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
/// [`RepositoryProvider::commit`] runs inside a single database transaction.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let room = repos.rooms().find_by_code("A1").await?;
/// let receipt = repos.commit(changeset).await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    db: DatabaseConnection,
    rooms: SeaOrmRoomRepository,
    reservations: SeaOrmReservationRepository,
    receivables: SeaOrmReceivableRepository,
    guests: SeaOrmGuestRepository,
    audit: SeaOrmAuditRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            rooms: SeaOrmRoomRepository::new(db.clone()),
            reservations: SeaOrmReservationRepository::new(db.clone()),
            receivables: SeaOrmReceivableRepository::new(db.clone()),
            guests: SeaOrmGuestRepository::new(db.clone()),
            audit: SeaOrmAuditRepository::new(db.clone()),
            db,
        }
    }

    /// Apply every write inside `txn`, counting completed writes so the
    /// caller can tell a primary failure from a cascade one.
    async fn apply(
        txn: &DatabaseTransaction,
        changeset: Changeset,
        written: &mut usize,
    ) -> DomainResult<CommitReceipt> {
        let mut receipt = CommitReceipt::default();

        if let Some(change) = changeset.reservation {
            let id = match change {
                Change::Insert(r) => {
                    let inserted = reservation_repository::to_active(&r, true)
                        .insert(txn)
                        .await
                        .map_err(db_err)?;
                    inserted.id
                }
                Change::Update(r) => {
                    let exists = reservation::Entity::find_by_id(r.id)
                        .one(txn)
                        .await
                        .map_err(db_err)?;
                    if exists.is_none() {
                        return Err(DomainError::not_found("Reservation", "id", r.id));
                    }
                    reservation_repository::to_active(&r, false)
                        .update(txn)
                        .await
                        .map_err(db_err)?;
                    r.id
                }
            };
            receipt.reservation_id = Some(id);
            *written += 1;
        }

        for change in changeset.rooms {
            match change {
                Change::Insert(r) => {
                    let exists = room::Entity::find_by_id(r.code.clone())
                        .one(txn)
                        .await
                        .map_err(db_err)?;
                    if exists.is_some() {
                        return Err(DomainError::Validation(format!("room {} already exists", r.code)));
                    }
                    room_repository::to_active(&r).insert(txn).await.map_err(db_err)?;
                }
                Change::Update(r) => {
                    let exists = room::Entity::find_by_id(r.code.clone())
                        .one(txn)
                        .await
                        .map_err(db_err)?;
                    if exists.is_none() {
                        return Err(DomainError::not_found("Room", "code", &r.code));
                    }
                    room_repository::to_active(&r).update(txn).await.map_err(db_err)?;
                }
            }
            *written += 1;
        }

        if let Some(change) = changeset.receivable {
            match change {
                Change::Insert(mut r) => {
                    if r.reservation_id == 0 {
                        r.reservation_id = receipt.reservation_id.unwrap_or_default();
                    }
                    let existing = receivable::Entity::find()
                        .filter(receivable::Column::ReservationId.eq(r.reservation_id))
                        .one(txn)
                        .await
                        .map_err(db_err)?;
                    if existing.is_some() {
                        return Err(DomainError::Validation(format!(
                            "reservation {} already has a receivable",
                            r.reservation_id
                        )));
                    }
                    receivable_repository::to_active(&r)
                        .insert(txn)
                        .await
                        .map_err(db_err)?;
                }
                Change::Update(r) => {
                    let exists = receivable::Entity::find_by_id(r.id.clone())
                        .one(txn)
                        .await
                        .map_err(db_err)?;
                    if exists.is_none() {
                        return Err(DomainError::not_found("Receivable", "id", &r.id));
                    }
                    receivable_repository::to_active(&r)
                        .update(txn)
                        .await
                        .map_err(db_err)?;
                }
            }
            *written += 1;
        }

        // Incremented in SQL so concurrent commits for one guest add up.
        for guest_id in changeset.guest_visits {
            let result = guest::Entity::update_many()
                .col_expr(
                    guest::Column::VisitCount,
                    Expr::col(guest::Column::VisitCount).add(1),
                )
                .col_expr(guest::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(guest::Column::Id.eq(guest_id.as_str()))
                .exec(txn)
                .await
                .map_err(db_err)?;
            if result.rows_affected == 0 {
                return Err(DomainError::not_found("Guest", "id", &guest_id));
            }
            *written += 1;
        }

        for mut entry in changeset.audit {
            if entry.reservation_id == Some(0) {
                entry.reservation_id = receipt.reservation_id;
            }
            audit_repository::to_active(&entry)
                .insert(txn)
                .await
                .map_err(db_err)?;
            *written += 1;
        }

        Ok(receipt)
    }
}

#[async_trait]
impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn rooms(&self) -> &dyn RoomRepository {
        &self.rooms
    }

    fn reservations(&self) -> &dyn ReservationRepository {
        &self.reservations
    }

    fn receivables(&self) -> &dyn ReceivableRepository {
        &self.receivables
    }

    fn guests(&self) -> &dyn GuestRepository {
        &self.guests
    }

    fn audit(&self) -> &dyn AuditRepository {
        &self.audit
    }

    async fn commit(&self, changeset: Changeset) -> DomainResult<CommitReceipt> {
        if changeset.is_empty() {
            return Ok(CommitReceipt::default());
        }

        let operation = changeset.primary();
        let txn = self.db.begin().await.map_err(db_err)?;
        let mut written = 0;

        match Self::apply(&txn, changeset, &mut written).await {
            Ok(receipt) => {
                txn.commit().await.map_err(|e| DomainError::CascadeFailure {
                    operation,
                    reason: e.to_string(),
                })?;
                debug!(operation, writes = written, "Changeset committed");
                Ok(receipt)
            }
            Err(e) => {
                if let Err(rollback) = txn.rollback().await {
                    warn!(operation, error = %rollback, "Rollback failed");
                }
                if written == 0 {
                    Err(e)
                } else {
                    warn!(operation, writes = written, error = %e, "Changeset rolled back");
                    Err(DomainError::CascadeFailure {
                        operation,
                        reason: e.to_string(),
                    })
                }
            }
        }
    }
}
