//! Guest domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Guest {
    /// Identity document number
    #[validate(length(min = 4, max = 20))]
    pub id: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 15))]
    pub phone: Option<String>,
    /// Completed (confirmed) stays, drives the loyalty discount tier
    pub visit_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Guest {
    pub fn new(id: impl Into<String>, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: None,
            phone: None,
            visit_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn record_visit(&mut self) {
        self.visit_count += 1;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_visit_increments_counter() {
        let mut guest = Guest::new("12345678", "Ana", "Quispe");
        guest.record_visit();
        guest.record_visit();
        assert_eq!(guest.visit_count, 2);
        assert_eq!(guest.full_name(), "Ana Quispe");
    }

    #[test]
    fn rejects_malformed_email() {
        let mut guest = Guest::new("12345678", "Ana", "Quispe");
        guest.email = Some("not-an-email".into());
        assert!(guest.validate().is_err());
    }
}
