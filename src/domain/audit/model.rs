//! Audit trail entries written alongside every lifecycle commit

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    Create,
    Confirm,
    Cancel,
    CheckIn,
    CheckOut,
    Settle,
    RoomOverride,
    FinishCleaning,
}

impl AuditAction {
    const ALL: [AuditAction; 8] = [
        Self::Create,
        Self::Confirm,
        Self::Cancel,
        Self::CheckIn,
        Self::CheckOut,
        Self::Settle,
        Self::RoomOverride,
        Self::FinishCleaning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Confirm => "Confirm",
            Self::Cancel => "Cancel",
            Self::CheckIn => "CheckIn",
            Self::CheckOut => "CheckOut",
            Self::Settle => "Settle",
            Self::RoomOverride => "RoomOverride",
            Self::FinishCleaning => "FinishCleaning",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| DomainError::Validation(format!("unknown audit action '{}'", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i32,
    /// `0` on a freshly created reservation; the store fills in the new id.
    pub reservation_id: Option<i32>,
    pub room_code: Option<String>,
    /// Principal id, or `"system"` for the sweep and payment webhooks
    pub actor_id: String,
    pub action: AuditAction,
    pub description: String,
    pub previous: serde_json::Value,
    pub current: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(actor_id: impl Into<String>, action: AuditAction, description: impl Into<String>) -> Self {
        Self {
            id: 0,
            reservation_id: None,
            room_code: None,
            actor_id: actor_id.into(),
            action,
            description: description.into(),
            previous: serde_json::Value::Null,
            current: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    pub fn reservation(mut self, id: i32) -> Self {
        self.reservation_id = Some(id);
        self
    }

    pub fn room(mut self, code: impl Into<String>) -> Self {
        self.room_code = Some(code.into());
        self
    }

    pub fn change(mut self, previous: serde_json::Value, current: serde_json::Value) -> Self {
        self.previous = previous;
        self.current = current;
        self
    }
}
