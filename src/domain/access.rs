//! Roles and capability sets
//!
//! Identity is resolved by the authentication collaborator; the core only
//! sees a [`Principal`] and checks the capability an operation needs.

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Guest,
    Admin,
    Receptionist,
    Supervisor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guest => "Guest",
            Self::Admin => "Admin",
            Self::Receptionist => "Receptionist",
            Self::Supervisor => "Supervisor",
        }
    }

    pub fn is_staff(&self) -> bool {
        !matches!(self, Self::Guest)
    }

    pub fn capabilities(&self) -> &'static [Capability] {
        use Capability::*;
        match self {
            Self::Guest => &[CreateReservation, CancelOwnReservation],
            Self::Receptionist | Self::Supervisor => &[
                CreateReservation,
                CancelOwnReservation,
                CancelAnyReservation,
                ConfirmReservation,
                CheckIn,
                CheckOut,
                FinishCleaning,
                OverrideRoomState,
                ViewAllReservations,
            ],
            Self::Admin => &[
                CreateReservation,
                CancelOwnReservation,
                CancelAnyReservation,
                ConfirmReservation,
                CheckIn,
                CheckOut,
                FinishCleaning,
                OverrideRoomState,
                ViewAllReservations,
                ManageInventory,
            ],
        }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    CreateReservation,
    /// Cancel a reservation whose guest is the principal
    CancelOwnReservation,
    CancelAnyReservation,
    ConfirmReservation,
    CheckIn,
    CheckOut,
    FinishCleaning,
    OverrideRoomState,
    ViewAllReservations,
    /// Register/retire rooms and room types
    ManageInventory,
}

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub role: Role,
}

impl Principal {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self { id: id.into(), role }
    }

    /// Internal actor used by the overdue sweep and payment webhooks.
    pub fn system() -> Self {
        Self::new("system", Role::Admin)
    }

    pub fn require(&self, capability: Capability) -> DomainResult<()> {
        if self.role.can(capability) {
            Ok(())
        } else {
            Err(DomainError::Forbidden(format!(
                "{} '{}' lacks {:?}",
                self.role, self.id, capability
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_roles_may_confirm() {
        for role in [Role::Admin, Role::Receptionist, Role::Supervisor] {
            assert!(role.can(Capability::ConfirmReservation), "{}", role);
            assert!(role.can(Capability::OverrideRoomState));
        }
    }

    #[test]
    fn guests_only_book_and_cancel_their_own() {
        let guest = Principal::new("12345678", Role::Guest);
        assert!(guest.require(Capability::CreateReservation).is_ok());
        assert!(guest.require(Capability::CancelOwnReservation).is_ok());
        let err = guest.require(Capability::CheckIn).unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[test]
    fn inventory_is_admin_only() {
        assert!(Role::Admin.can(Capability::ManageInventory));
        assert!(!Role::Receptionist.can(Capability::ManageInventory));
    }
}
