//! Receivable ledger
//!
//! Tracks what each reservation owes and applies payment-settlement
//! outcomes reported by the payment collaborator. Settlement is idempotent:
//! once a receivable is Paid or Overdue, later deliveries are no-ops.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use tracing::{info, warn};

use crate::application::events::{Event, SettlementUnconfirmedEvent, SharedEventBus};
use crate::application::lifecycle::{
    observe, snapshot, stage_cancel, stage_confirm, stage_occupy, Plan, RoomLocks,
};
use crate::domain::{
    AuditAction, AuditEntry, Change, Changeset, DomainError, DomainResult, ErrorKind, Principal,
    Receivable, RepositoryProvider, Reservation, ReservationStatus, Room, RoomState,
};

pub struct ReceivableLedger {
    repos: Arc<dyn RepositoryProvider>,
    events: SharedEventBus,
    locks: RoomLocks,
    payment_grace_days: i64,
}

impl ReceivableLedger {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        events: SharedEventBus,
        locks: RoomLocks,
        payment_grace_days: i64,
    ) -> Self {
        Self {
            repos,
            events,
            locks,
            payment_grace_days,
        }
    }

    async fn load(&self, receivable_id: &str) -> DomainResult<Receivable> {
        self.repos
            .receivables()
            .find_by_id(receivable_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Receivable", "id", receivable_id))
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

    /// Open the receivable for a reservation, or return the existing one.
    pub async fn open(&self, reservation_id: i32) -> DomainResult<Receivable> {
        let reservation = self.load_reservation(reservation_id).await?;
        let _guard = self.locks.acquire(&reservation.room_code).await;

        if let Some(existing) = self.repos.receivables().find_by_reservation(reservation_id).await? {
            return Ok(existing);
        }
        if reservation.status.is_final() {
            return Err(DomainError::Validation(format!(
                "reservation {} is {} and cannot be billed",
                reservation_id, reservation.status
            )));
        }

        let due = Utc::now().date_naive() + Duration::days(self.payment_grace_days);
        let receivable = Receivable::open(reservation_id, &reservation.guest_id, reservation.total(), due);

        let mut plan = Plan::new();
        plan.receivable(Change::Insert(receivable.clone()));
        plan.commit(self.repos.as_ref(), &self.events).await?;

        info!(
            receivable_id = %receivable.id,
            reservation_id,
            total = %receivable.total,
            due_date = %receivable.due_date,
            "Receivable opened"
        );
        Ok(receivable)
    }

    /// Record the external payment-intent token for a pending receivable.
    pub async fn attach_payment_reference(&self, receivable_id: &str, reference: &str) -> DomainResult<Receivable> {
        if reference.trim().is_empty() {
            return Err(DomainError::Validation("payment reference must not be empty".to_string()));
        }
        if let Some(other) = self.repos.receivables().find_by_payment_reference(reference).await? {
            if other.id != receivable_id {
                return Err(DomainError::Validation(format!(
                    "payment reference already attached to receivable {}",
                    other.id
                )));
            }
            return Ok(other);
        }

        let reservation_id = self.load(receivable_id).await?.reservation_id;
        let room_code = self.load_reservation(reservation_id).await?.room_code;
        let _guard = self.locks.acquire(&room_code).await;

        let mut receivable = self.load(receivable_id).await?;
        if receivable.status.is_terminal() {
            return Err(DomainError::InvalidTransition {
                entity: "Receivable",
                id: receivable.id.clone(),
                from: receivable.status.to_string(),
                to: "PaymentInitiated".to_string(),
            });
        }
        receivable.payment_reference = Some(reference.to_string());
        receivable.updated_at = Utc::now();
        self.repos
            .commit(Changeset::new().with_receivable(Change::Update(receivable.clone())))
            .await?;

        info!(receivable_id, reference, "Payment reference attached");
        Ok(receivable)
    }

    /// Apply a settlement outcome from the payment collaborator.
    pub async fn settle(&self, receivable_id: &str, succeeded: bool) -> DomainResult<Receivable> {
        observe("settle", self.settle_inner(receivable_id, succeeded).await)
    }

    /// Resolve a webhook event by its payment-intent token and settle it.
    pub async fn settle_by_reference(&self, reference: &str, succeeded: bool) -> DomainResult<Receivable> {
        let receivable = self
            .repos
            .receivables()
            .find_by_payment_reference(reference)
            .await?
            .ok_or_else(|| DomainError::not_found("Receivable", "payment_reference", reference))?;
        self.settle(&receivable.id, succeeded).await
    }

    async fn settle_inner(&self, receivable_id: &str, succeeded: bool) -> DomainResult<Receivable> {
        let reservation_id = self.load(receivable_id).await?.reservation_id;
        let room_code = self.load_reservation(reservation_id).await?.room_code;
        let _guard = self.locks.acquire(&room_code).await;

        let mut receivable = self.load(receivable_id).await?;
        if !receivable.settle(succeeded) {
            metrics::counter!("hotel_receivable_settlements_total", "outcome" => "duplicate").increment(1);
            info!(
                receivable_id,
                status = %receivable.status,
                "Settlement ignored, receivable already terminal"
            );
            return Ok(receivable);
        }

        let system = Principal::system();
        let mut reservation = self.load_reservation(reservation_id).await?;
        let mut room = self.load_room(&room_code).await?;
        let before = snapshot(&reservation);
        let previous_status = reservation.status;

        let mut plan = Plan::new();
        plan.receivable(Change::Update(receivable.clone()));

        if succeeded {
            match previous_status {
                ReservationStatus::Pending => {
                    match stage_confirm(self.repos.as_ref(), &mut reservation, &mut room).await {
                        Ok(room_before) => {
                            stage_occupy(&mut room)?;
                            plan.reservation(Change::Update(reservation.clone()), Some(previous_status));
                            plan.room(room, room_before);
                            plan.guest_visit(&reservation.guest_id);
                            plan.audit(
                                AuditEntry::new(&system.id, AuditAction::Confirm, "Confirmed by payment")
                                    .reservation(reservation_id)
                                    .room(&room_code)
                                    .change(before.clone(), snapshot(&reservation)),
                            );
                        }
                        Err(e) if matches!(e.kind(), ErrorKind::Conflict | ErrorKind::InvalidTransition) => {
                            warn!(
                                receivable_id,
                                reservation_id,
                                room_code = %room_code,
                                error = %e,
                                "Payment received but reservation could not be confirmed"
                            );
                            plan.event(Event::SettlementUnconfirmed(SettlementUnconfirmedEvent {
                                receivable_id: receivable.id.clone(),
                                reservation_id,
                                room_code: room_code.clone(),
                                reason: e.to_string(),
                                timestamp: Utc::now(),
                            }));
                        }
                        Err(e) => return Err(e),
                    }
                }
                // Staff confirmed first: the room this reservation holds becomes occupied.
                ReservationStatus::Confirmed if room.state == RoomState::Reserved => {
                    let room_before = stage_occupy(&mut room)?;
                    plan.room(room, room_before);
                }
                _ => {}
            }
        } else if matches!(previous_status, ReservationStatus::Pending | ReservationStatus::Confirmed) {
            match stage_cancel(&mut reservation, &mut room, Some("payment failed".to_string())) {
                Ok(room_before) => {
                    plan.reservation(Change::Update(reservation.clone()), Some(previous_status));
                    if let Some(old) = room_before {
                        plan.room(room, old);
                    }
                    plan.audit(
                        AuditEntry::new(&system.id, AuditAction::Cancel, "Cancelled after failed payment")
                            .reservation(reservation_id)
                            .room(&room_code)
                            .change(before.clone(), snapshot(&reservation)),
                    );
                }
                Err(e) => {
                    warn!(reservation_id, error = %e, "Failed payment left reservation unchanged");
                }
            }
        }

        plan.audit(
            AuditEntry::new(
                &system.id,
                AuditAction::Settle,
                if succeeded { "Payment succeeded" } else { "Payment failed" },
            )
            .reservation(reservation_id)
            .room(&room_code)
            .change(
                serde_json::json!({ "receivable": receivable_id, "status": "Pending" }),
                serde_json::json!({
                    "receivable": receivable_id,
                    "status": receivable.status,
                    "paid": receivable.paid.to_string(),
                }),
            ),
        );
        plan.commit(self.repos.as_ref(), &self.events).await?;

        let outcome = if succeeded { "paid" } else { "overdue" };
        metrics::counter!("hotel_receivable_settlements_total", "outcome" => outcome).increment(1);
        info!(
            receivable_id,
            reservation_id,
            outcome,
            reservation_status = %reservation.status,
            "Receivable settled"
        );
        Ok(receivable)
    }

    /// Mark every Pending receivable due before `today` as Overdue, cascading
    /// cancellation. Returns how many were swept.
    pub async fn sweep_overdue(&self, today: NaiveDate) -> DomainResult<usize> {
        let due = self.repos.receivables().find_past_due(today).await?;
        if due.is_empty() {
            return Ok(0);
        }
        info!(count = due.len(), "Sweeping overdue receivables");

        let mut swept = 0;
        for receivable in due {
            match self.settle(&receivable.id, false).await {
                Ok(_) => swept += 1,
                Err(e) if e.is_transient() => return Err(e),
                Err(e) => warn!(receivable_id = %receivable.id, error = %e, "Failed to sweep receivable"),
            }
        }
        metrics::counter!("hotel_overdue_swept_total").increment(swept as u64);
        Ok(swept)
    }
}
