//! Receivable domain entity (money owed against one reservation)

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceivableStatus {
    Pending,
    Paid,
    Overdue,
    Cancelled,
}

impl ReceivableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Paid => "Paid",
            Self::Overdue => "Overdue",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            "Overdue" => Ok(Self::Overdue),
            "Cancelled" => Ok(Self::Cancelled),
            other => Err(DomainError::Validation(format!("unknown receivable status '{}'", other))),
        }
    }

    /// Settlement events arriving after a terminal state are ignored.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for ReceivableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receivable {
    /// Opaque token
    pub id: String,
    pub reservation_id: i32,
    pub guest_id: String,
    pub total: Decimal,
    pub paid: Decimal,
    pub due_date: NaiveDate,
    pub status: ReceivableStatus,
    /// External payment-intent token, attached when the payment is initiated
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Receivable {
    pub fn open(reservation_id: i32, guest_id: impl Into<String>, total: Decimal, due_date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            reservation_id,
            guest_id: guest_id.into(),
            total,
            paid: Decimal::ZERO,
            due_date,
            status: ReceivableStatus::Pending,
            payment_reference: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn balance(&self) -> Decimal {
        self.total - self.paid
    }

    pub fn is_past_due(&self, today: NaiveDate) -> bool {
        self.status == ReceivableStatus::Pending && self.due_date < today
    }

    /// Apply a settlement outcome. Returns `false` (no change) when already
    /// terminal, so duplicate webhook deliveries are no-ops.
    pub fn settle(&mut self, succeeded: bool) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        if succeeded {
            self.paid = self.total;
            self.status = ReceivableStatus::Paid;
        } else {
            self.status = ReceivableStatus::Overdue;
        }
        self.updated_at = Utc::now();
        true
    }

    /// Void a receivable whose reservation was cancelled before payment.
    pub fn void(&mut self) -> bool {
        if self.status != ReceivableStatus::Pending {
            return false;
        }
        self.status = ReceivableStatus::Cancelled;
        self.updated_at = Utc::now();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Receivable {
        Receivable::open(
            1,
            "12345678",
            Decimal::new(20000, 2),
            NaiveDate::from_ymd_opt(2026, 3, 13).unwrap(),
        )
    }

    #[test]
    fn opens_pending_with_full_balance() {
        let r = sample();
        assert_eq!(r.status, ReceivableStatus::Pending);
        assert_eq!(r.balance(), r.total);
    }

    #[test]
    fn success_pays_in_full() {
        let mut r = sample();
        assert!(r.settle(true));
        assert_eq!(r.status, ReceivableStatus::Paid);
        assert_eq!(r.balance(), Decimal::ZERO);
    }

    #[test]
    fn second_settlement_is_a_noop() {
        let mut r = sample();
        assert!(r.settle(false));
        assert!(!r.settle(true));
        assert_eq!(r.status, ReceivableStatus::Overdue);
        assert_eq!(r.paid, Decimal::ZERO);
    }

    #[test]
    fn past_due_only_while_pending() {
        let mut r = sample();
        let later = NaiveDate::from_ymd_opt(2026, 3, 20).unwrap();
        assert!(r.is_past_due(later));
        assert!(!r.is_past_due(r.due_date));
        r.settle(true);
        assert!(!r.is_past_due(later));
    }
}
