//! Receivable repository interface

use async_trait::async_trait;
use chrono::NaiveDate;

use super::model::Receivable;
use crate::domain::DomainResult;

#[async_trait]
pub trait ReceivableRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Receivable>>;

    async fn find_by_reservation(&self, reservation_id: i32) -> DomainResult<Option<Receivable>>;

    async fn find_by_payment_reference(&self, reference: &str) -> DomainResult<Option<Receivable>>;

    /// Pending receivables with `due_date < today`
    async fn find_past_due(&self, today: NaiveDate) -> DomainResult<Vec<Receivable>>;
}
