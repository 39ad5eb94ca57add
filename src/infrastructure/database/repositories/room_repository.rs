//! SeaORM implementation of RoomRepository

use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set,
};
use tracing::debug;

use crate::domain::room::{Room, RoomFilter, RoomRepository, RoomState, RoomType};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{room, room_type};

pub struct SeaOrmRoomRepository {
    db: DatabaseConnection,
}

impl SeaOrmRoomRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

pub(super) fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Storage(format!("Database error: {}", e))
}

/// Amounts are stored as decimal text so no precision is lost.
pub(super) fn money(raw: &str) -> DomainResult<Decimal> {
    Decimal::from_str(raw)
        .map_err(|e| DomainError::Storage(format!("corrupt amount '{}': {}", raw, e)))
}

fn type_to_domain(m: room_type::Model) -> DomainResult<RoomType> {
    Ok(RoomType {
        id: m.id,
        name: m.name,
        description: m.description,
        max_capacity: m.max_capacity,
        base_price: money(&m.base_price)?,
    })
}

fn model_to_domain(m: room::Model, room_type: Option<room_type::Model>) -> DomainResult<Room> {
    let room_type = room_type.ok_or_else(|| {
        DomainError::Storage(format!("room {} references missing type {}", m.code, m.room_type_id))
    })?;
    Ok(Room {
        room_type: type_to_domain(room_type)?,
        state: RoomState::parse(&m.state)?,
        current_price: money(&m.current_price)?,
        code: m.code,
        number: m.number,
        floor: m.floor,
        notes: m.notes,
        last_cleaned_at: m.last_cleaned_at,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

pub(super) fn to_active(r: &Room) -> room::ActiveModel {
    room::ActiveModel {
        code: Set(r.code.clone()),
        number: Set(r.number.clone()),
        floor: Set(r.floor),
        room_type_id: Set(r.room_type.id),
        state: Set(r.state.as_str().to_string()),
        current_price: Set(r.current_price.to_string()),
        notes: Set(r.notes.clone()),
        last_cleaned_at: Set(r.last_cleaned_at),
        created_at: Set(r.created_at),
        updated_at: Set(r.updated_at),
    }
}

// ── RoomRepository impl ─────────────────────────────────────────

#[async_trait]
impl RoomRepository for SeaOrmRoomRepository {
    async fn find_by_code(&self, code: &str) -> DomainResult<Option<Room>> {
        let found = room::Entity::find_by_id(code.to_string())
            .find_also_related(room_type::Entity)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        found.map(|(m, t)| model_to_domain(m, t)).transpose()
    }

    async fn list(&self, filter: &RoomFilter) -> DomainResult<Vec<Room>> {
        let mut query = room::Entity::find();
        if let Some(state) = filter.state {
            query = query.filter(room::Column::State.eq(state.as_str()));
        }
        if let Some(floor) = filter.floor {
            query = query.filter(room::Column::Floor.eq(floor));
        }
        if let Some(type_id) = filter.room_type_id {
            query = query.filter(room::Column::RoomTypeId.eq(type_id));
        }

        let rows = query
            .find_also_related(room_type::Entity)
            .order_by_asc(room::Column::Code)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let mut rooms = Vec::with_capacity(rows.len());
        for (m, t) in rows {
            let room = model_to_domain(m, t)?;
            if filter.matches(&room) {
                rooms.push(room);
            }
        }
        Ok(rooms)
    }

    async fn delete(&self, code: &str) -> DomainResult<()> {
        debug!(room_code = code, "Deleting room");
        let result = room::Entity::delete_by_id(code.to_string())
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(DomainError::not_found("Room", "code", code));
        }
        Ok(())
    }

    async fn find_type(&self, id: i32) -> DomainResult<Option<RoomType>> {
        let model = room_type::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(type_to_domain).transpose()
    }

    async fn list_types(&self) -> DomainResult<Vec<RoomType>> {
        let models = room_type::Entity::find()
            .order_by_asc(room_type::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models.into_iter().map(type_to_domain).collect()
    }

    async fn save_type(&self, rt: RoomType) -> DomainResult<RoomType> {
        debug!(name = %rt.name, "Saving room type");

        let existing = room_type::Entity::find()
            .filter(room_type::Column::Name.eq(rt.name.as_str()))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        if existing.is_some() {
            return Err(DomainError::Validation(format!(
                "room type '{}' already exists",
                rt.name
            )));
        }

        let model = room_type::ActiveModel {
            id: NotSet,
            name: Set(rt.name),
            description: Set(rt.description),
            max_capacity: Set(rt.max_capacity),
            base_price: Set(rt.base_price.to_string()),
        };
        let inserted = model.insert(&self.db).await.map_err(db_err)?;
        type_to_domain(inserted)
    }
}
