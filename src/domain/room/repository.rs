//! Room repository interface

use async_trait::async_trait;

use super::model::{Room, RoomState, RoomType};
use crate::domain::DomainResult;

/// Criteria for room listings. `None` fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct RoomFilter {
    pub room_type_id: Option<i32>,
    pub floor: Option<i32>,
    pub min_capacity: Option<i32>,
    pub state: Option<RoomState>,
}

impl RoomFilter {
    pub fn available() -> Self {
        Self {
            state: Some(RoomState::Available),
            ..Self::default()
        }
    }

    pub fn matches(&self, room: &Room) -> bool {
        self.room_type_id.map_or(true, |t| room.room_type.id == t)
            && self.floor.map_or(true, |f| room.floor == f)
            && self.min_capacity.map_or(true, |c| room.room_type.max_capacity >= c)
            && self.state.map_or(true, |s| room.state == s)
    }
}

#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn find_by_code(&self, code: &str) -> DomainResult<Option<Room>>;

    /// Rooms matching the filter, ordered by code
    async fn list(&self, filter: &RoomFilter) -> DomainResult<Vec<Room>>;

    /// Remove a room from inventory. Callers check referential protection first.
    async fn delete(&self, code: &str) -> DomainResult<()>;

    async fn find_type(&self, id: i32) -> DomainResult<Option<RoomType>>;

    async fn list_types(&self) -> DomainResult<Vec<RoomType>>;

    /// Insert a room type; the returned value carries the assigned id
    async fn save_type(&self, room_type: RoomType) -> DomainResult<RoomType>;
}
