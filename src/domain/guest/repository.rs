//! Guest repository interface

use async_trait::async_trait;

use super::model::Guest;
use crate::domain::DomainResult;

#[async_trait]
pub trait GuestRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Guest>>;

    /// Insert a new guest; fails with a validation error on duplicate id
    async fn save(&self, guest: Guest) -> DomainResult<()>;

    async fn list(&self) -> DomainResult<Vec<Guest>>;
}
