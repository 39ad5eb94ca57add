//! SeaORM implementation of ReceivableRepository

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};

use crate::domain::receivable::{Receivable, ReceivableRepository, ReceivableStatus};
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::receivable;

use super::room_repository::{db_err, money};

pub struct SeaOrmReceivableRepository {
    db: DatabaseConnection,
}

impl SeaOrmReceivableRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(m: receivable::Model) -> DomainResult<Receivable> {
    Ok(Receivable {
        total: money(&m.total)?,
        paid: money(&m.paid)?,
        status: ReceivableStatus::parse(&m.status)?,
        id: m.id,
        reservation_id: m.reservation_id,
        guest_id: m.guest_id,
        due_date: m.due_date,
        payment_reference: m.payment_reference,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

pub(super) fn to_active(r: &Receivable) -> receivable::ActiveModel {
    receivable::ActiveModel {
        id: Set(r.id.clone()),
        reservation_id: Set(r.reservation_id),
        guest_id: Set(r.guest_id.clone()),
        total: Set(r.total.to_string()),
        paid: Set(r.paid.to_string()),
        due_date: Set(r.due_date),
        status: Set(r.status.as_str().to_string()),
        payment_reference: Set(r.payment_reference.clone()),
        created_at: Set(r.created_at),
        updated_at: Set(r.updated_at),
    }
}

#[async_trait]
impl ReceivableRepository for SeaOrmReceivableRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Receivable>> {
        let model = receivable::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_domain).transpose()
    }

    async fn find_by_reservation(&self, reservation_id: i32) -> DomainResult<Option<Receivable>> {
        let model = receivable::Entity::find()
            .filter(receivable::Column::ReservationId.eq(reservation_id))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_domain).transpose()
    }

    async fn find_by_payment_reference(&self, reference: &str) -> DomainResult<Option<Receivable>> {
        let model = receivable::Entity::find()
            .filter(receivable::Column::PaymentReference.eq(reference))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_domain).transpose()
    }

    async fn find_past_due(&self, today: NaiveDate) -> DomainResult<Vec<Receivable>> {
        let models = receivable::Entity::find()
            .filter(receivable::Column::Status.eq(ReceivableStatus::Pending.as_str()))
            .filter(receivable::Column::DueDate.lt(today))
            .order_by_asc(receivable::Column::DueDate)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models.into_iter().map(model_to_domain).collect()
    }
}
