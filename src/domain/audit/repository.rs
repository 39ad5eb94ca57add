//! Audit log repository interface (read side; writes go through commits)

use async_trait::async_trait;

use super::model::AuditEntry;
use crate::domain::DomainResult;

#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Oldest first
    async fn list_for_reservation(&self, reservation_id: i32) -> DomainResult<Vec<AuditEntry>>;

    async fn list_for_room(&self, room_code: &str) -> DomainResult<Vec<AuditEntry>>;
}
