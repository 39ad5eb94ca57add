use thiserror::Error;

/// Coarse classification of a [`DomainError`], used by collaborators
/// (API layer, webhook handler) to pick a response without matching on
/// individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    InvalidTransition,
    Conflict,
    NotFound,
    Forbidden,
    Cascade,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::InvalidTransition => "invalid_transition",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::Cascade => "cascade_failure",
            Self::Storage => "storage",
        }
    }
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Invalid transition for {entity} {id}: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        id: String,
        from: String,
        to: String,
    },

    #[error("Reservation {id} is not pending (status: {status})")]
    NotPending { id: i32, status: String },

    #[error("Reservation {id} is not confirmed (status: {status})")]
    NotConfirmed { id: i32, status: String },

    #[error("Reservation {id} has no check-in recorded")]
    NoCheckinRecorded { id: i32 },

    #[error("Room {room_code} is already booked by reservation {conflicting_id} in the requested window")]
    OverlapConflict {
        room_code: String,
        conflicting_id: i32,
    },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Operation {operation} rolled back: {reason}")]
    CascadeFailure {
        operation: &'static str,
        reason: String,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, field: &'static str, value: impl ToString) -> Self {
        Self::NotFound {
            entity,
            field,
            value: value.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::InvalidTransition { .. }
            | Self::NotPending { .. }
            | Self::NotConfirmed { .. }
            | Self::NoCheckinRecorded { .. } => ErrorKind::InvalidTransition,
            Self::OverlapConflict { .. } => ErrorKind::Conflict,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::CascadeFailure { .. } => ErrorKind::Cascade,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Whether this error is likely transient (e.g. DB connection lost)
    /// and the operation may succeed if retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::CascadeFailure { .. })
    }
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    let msg = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    format!("{}: {}", field, msg)
                })
            })
            .collect();

        if fields.is_empty() {
            Self::Validation("validation failed".to_string())
        } else {
            Self::Validation(fields.join("; "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_is_a_conflict() {
        let err = DomainError::OverlapConflict {
            room_code: "A1".into(),
            conflicting_id: 7,
        };
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(!err.is_transient());
        assert!(err.to_string().contains("reservation 7"));
    }

    #[test]
    fn lifecycle_rejections_are_invalid_transitions() {
        assert_eq!(
            DomainError::NoCheckinRecorded { id: 1 }.kind(),
            ErrorKind::InvalidTransition
        );
        assert_eq!(
            DomainError::NotPending {
                id: 1,
                status: "Cancelled".into()
            }
            .kind(),
            ErrorKind::InvalidTransition
        );
    }

    #[test]
    fn storage_errors_are_transient() {
        assert!(DomainError::Storage("connection reset".into()).is_transient());
        assert!(!DomainError::Validation("bad dates".into()).is_transient());
    }
}
