//! SeaORM implementation of ReservationRepository

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, NotSet, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, Set,
};

use crate::domain::reservation::{
    Reservation, ReservationKind, ReservationQuery, ReservationRepository, ReservationStatus,
    StayWindow,
};
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::{reservation, room};
use crate::shared::pagination::{PaginatedResult, PaginationParams};

use super::room_repository::{db_err, money};

pub struct SeaOrmReservationRepository {
    db: DatabaseConnection,
}

impl SeaOrmReservationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Filtered select, newest first.
    async fn select(&self, q: &ReservationQuery) -> DomainResult<Select<reservation::Entity>> {
        let mut query = reservation::Entity::find();
        if let Some(guest_id) = &q.guest_id {
            query = query.filter(reservation::Column::GuestId.eq(guest_id.as_str()));
        }
        if let Some(room_code) = &q.room_code {
            query = query.filter(reservation::Column::RoomCode.eq(room_code.as_str()));
        }
        if !q.statuses.is_empty() {
            query = query.filter(reservation::Column::Status.is_in(status_strings(&q.statuses)));
        }
        if !q.room_states.is_empty() {
            let states: Vec<&str> = q.room_states.iter().map(|s| s.as_str()).collect();
            let codes: Vec<String> = room::Entity::find()
                .select_only()
                .column(room::Column::Code)
                .filter(room::Column::State.is_in(states))
                .into_tuple()
                .all(&self.db)
                .await
                .map_err(db_err)?;
            query = query.filter(reservation::Column::RoomCode.is_in(codes));
        }

        Ok(query
            .order_by_desc(reservation::Column::CreatedAt)
            .order_by_desc(reservation::Column::Id))
    }
}

// ── Conversion helpers ──────────────────────────────────────────

pub(super) fn model_to_domain(m: reservation::Model) -> DomainResult<Reservation> {
    Ok(Reservation {
        id: m.id,
        kind: ReservationKind::parse(&m.kind)?,
        status: ReservationStatus::parse(&m.status)?,
        window: StayWindow::new(m.checkin, m.checkout)?,
        nightly_price: money(&m.nightly_price)?,
        discount: money(&m.discount)?,
        taxes: money(&m.taxes)?,
        guest_id: m.guest_id,
        staff_id: m.staff_id,
        room_code: m.room_code,
        actual_checkin: m.actual_checkin,
        actual_checkout: m.actual_checkout,
        guest_count: m.guest_count,
        notes: m.notes,
        cancellation_reason: m.cancellation_reason,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

/// Active model for `r`. Inserts leave the id to the database.
pub(super) fn to_active(r: &Reservation, insert: bool) -> reservation::ActiveModel {
    reservation::ActiveModel {
        id: if insert { NotSet } else { Set(r.id) },
        guest_id: Set(r.guest_id.clone()),
        staff_id: Set(r.staff_id.clone()),
        room_code: Set(r.room_code.clone()),
        kind: Set(r.kind.as_str().to_string()),
        status: Set(r.status.as_str().to_string()),
        checkin: Set(r.window.checkin),
        checkout: Set(r.window.checkout),
        actual_checkin: Set(r.actual_checkin),
        actual_checkout: Set(r.actual_checkout),
        nightly_price: Set(r.nightly_price.to_string()),
        discount: Set(r.discount.to_string()),
        taxes: Set(r.taxes.to_string()),
        guest_count: Set(r.guest_count),
        notes: Set(r.notes.clone()),
        cancellation_reason: Set(r.cancellation_reason.clone()),
        created_at: Set(r.created_at),
        updated_at: Set(r.updated_at),
    }
}

fn status_strings(statuses: &[ReservationStatus]) -> Vec<&'static str> {
    statuses.iter().map(|s| s.as_str()).collect()
}

// ── ReservationRepository impl ──────────────────────────────────

#[async_trait]
impl ReservationRepository for SeaOrmReservationRepository {
    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Reservation>> {
        let model = reservation::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_domain).transpose()
    }

    async fn find_overlapping(
        &self,
        room_code: &str,
        window: &StayWindow,
        statuses: &[ReservationStatus],
        exclude_id: Option<i32>,
    ) -> DomainResult<Vec<Reservation>> {
        let mut query = reservation::Entity::find()
            .filter(reservation::Column::RoomCode.eq(room_code))
            .filter(reservation::Column::Status.is_in(status_strings(statuses)))
            .filter(reservation::Column::Checkin.lt(window.checkout))
            .filter(reservation::Column::Checkout.gt(window.checkin));
        if let Some(id) = exclude_id {
            query = query.filter(reservation::Column::Id.ne(id));
        }

        let models = query
            .order_by_asc(reservation::Column::Checkin)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models.into_iter().map(model_to_domain).collect()
    }

    async fn query(&self, q: &ReservationQuery) -> DomainResult<Vec<Reservation>> {
        let models = self.select(q).await?.all(&self.db).await.map_err(db_err)?;
        models.into_iter().map(model_to_domain).collect()
    }

    async fn query_page(
        &self,
        q: &ReservationQuery,
        page: PaginationParams,
    ) -> DomainResult<PaginatedResult<Reservation>> {
        let query = self.select(q).await?;
        let total = query.clone().count(&self.db).await.map_err(db_err)?;

        let models = query
            .offset(page.offset() as u64)
            .limit(page.limit as u64)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        let items = models
            .into_iter()
            .map(model_to_domain)
            .collect::<DomainResult<Vec<_>>>()?;

        Ok(PaginatedResult::new(items, total, page))
    }

    async fn count_for_room(&self, room_code: &str) -> DomainResult<u64> {
        reservation::Entity::find()
            .filter(reservation::Column::RoomCode.eq(room_code))
            .count(&self.db)
            .await
            .map_err(db_err)
    }
}
