//! SeaORM implementation of AuditRepository

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter, QueryOrder, Set};

use crate::domain::audit::{AuditAction, AuditEntry, AuditRepository};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::audit_log;

use super::room_repository::db_err;

pub struct SeaOrmAuditRepository {
    db: DatabaseConnection,
}

impl SeaOrmAuditRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn json(raw: &str) -> DomainResult<serde_json::Value> {
    serde_json::from_str(raw).map_err(|e| DomainError::Storage(format!("corrupt audit snapshot: {}", e)))
}

fn model_to_domain(m: audit_log::Model) -> DomainResult<AuditEntry> {
    Ok(AuditEntry {
        action: AuditAction::parse(&m.action)?,
        previous: json(&m.previous)?,
        current: json(&m.current)?,
        id: m.id,
        reservation_id: m.reservation_id,
        room_code: m.room_code,
        actor_id: m.actor_id,
        description: m.description,
        created_at: m.created_at,
    })
}

pub(super) fn to_active(e: &AuditEntry) -> audit_log::ActiveModel {
    audit_log::ActiveModel {
        id: NotSet,
        reservation_id: Set(e.reservation_id),
        room_code: Set(e.room_code.clone()),
        actor_id: Set(e.actor_id.clone()),
        action: Set(e.action.as_str().to_string()),
        description: Set(e.description.clone()),
        previous: Set(e.previous.to_string()),
        current: Set(e.current.to_string()),
        created_at: Set(e.created_at),
    }
}

#[async_trait]
impl AuditRepository for SeaOrmAuditRepository {
    async fn list_for_reservation(&self, reservation_id: i32) -> DomainResult<Vec<AuditEntry>> {
        let models = audit_log::Entity::find()
            .filter(audit_log::Column::ReservationId.eq(reservation_id))
            .order_by_asc(audit_log::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models.into_iter().map(model_to_domain).collect()
    }

    async fn list_for_room(&self, room_code: &str) -> DomainResult<Vec<AuditEntry>> {
        let models = audit_log::Entity::find()
            .filter(audit_log::Column::RoomCode.eq(room_code))
            .order_by_asc(audit_log::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models.into_iter().map(model_to_domain).collect()
    }
}
