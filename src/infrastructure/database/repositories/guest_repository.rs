//! SeaORM implementation of GuestRepository

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use tracing::debug;

use crate::domain::guest::{Guest, GuestRepository};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::guest;

use super::room_repository::db_err;

pub struct SeaOrmGuestRepository {
    db: DatabaseConnection,
}

impl SeaOrmGuestRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn model_to_domain(m: guest::Model) -> Guest {
    Guest {
        id: m.id,
        first_name: m.first_name,
        last_name: m.last_name,
        email: m.email,
        phone: m.phone,
        visit_count: u32::try_from(m.visit_count).unwrap_or_default(),
        created_at: m.created_at,
        updated_at: m.updated_at,
    }
}

fn to_active(g: &Guest) -> guest::ActiveModel {
    guest::ActiveModel {
        id: Set(g.id.clone()),
        first_name: Set(g.first_name.clone()),
        last_name: Set(g.last_name.clone()),
        email: Set(g.email.clone()),
        phone: Set(g.phone.clone()),
        visit_count: Set(i32::try_from(g.visit_count).unwrap_or(i32::MAX)),
        created_at: Set(g.created_at),
        updated_at: Set(g.updated_at),
    }
}

#[async_trait]
impl GuestRepository for SeaOrmGuestRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Guest>> {
        let model = guest::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.map(model_to_domain))
    }

    async fn save(&self, g: Guest) -> DomainResult<()> {
        debug!(guest_id = %g.id, "Saving guest");

        let existing = guest::Entity::find_by_id(g.id.clone())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        if existing.is_some() {
            return Err(DomainError::Validation(format!("guest {} already exists", g.id)));
        }

        to_active(&g).insert(&self.db).await.map_err(db_err)?;
        Ok(())
    }

    async fn list(&self) -> DomainResult<Vec<Guest>> {
        let models = guest::Entity::find()
            .order_by_asc(guest::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }
}
