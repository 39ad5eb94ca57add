//! Guest registration and lookup

use std::sync::Arc;

use tracing::info;
use validator::Validate;

use crate::domain::{DomainError, DomainResult, Guest, RepositoryProvider};

pub struct GuestDirectory {
    repos: Arc<dyn RepositoryProvider>,
}

impl GuestDirectory {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    pub async fn register(&self, guest: Guest) -> DomainResult<Guest> {
        guest.validate()?;
        if self.repos.guests().find_by_id(&guest.id).await?.is_some() {
            return Err(DomainError::Validation(format!("guest {} is already registered", guest.id)));
        }
        self.repos.guests().save(guest.clone()).await?;
        info!(guest_id = %guest.id, "Guest registered");
        Ok(guest)
    }

    pub async fn get(&self, id: &str) -> DomainResult<Guest> {
        self.repos
            .guests()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Guest", "id", id))
    }

    pub async fn list(&self) -> DomainResult<Vec<Guest>> {
        self.repos.guests().list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;
    use crate::infrastructure::storage::InMemoryStore;

    #[tokio::test]
    async fn registers_once() {
        let directory = GuestDirectory::new(Arc::new(InMemoryStore::new()));
        let mut guest = Guest::new("12345678", "Ana", "Quispe");
        guest.email = Some("ana@example.com".into());
        directory.register(guest.clone()).await.unwrap();

        let err = directory.register(guest).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(directory.get("12345678").await.unwrap().full_name(), "Ana Quispe");
    }

    #[tokio::test]
    async fn rejects_invalid_contact_data() {
        let directory = GuestDirectory::new(Arc::new(InMemoryStore::new()));
        let mut guest = Guest::new("12345678", "Ana", "Quispe");
        guest.phone = Some("0".repeat(30));
        let err = directory.register(guest).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(directory.list().await.unwrap().is_empty());
    }
}
