//! User role as declared by the backend (`tipo` field).

use serde::{Deserialize, Serialize};

/// Role of a registered user.
///
/// The backend only distinguishes `"admin"` from everything else, so any other
/// value is kept verbatim for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserRole {
    /// Store administrator: may register products and inspect all carts.
    Admin,
    /// Any other role (e.g. `"cliente"`).
    Other(String),
}

impl UserRole {
    /// Wire value for the admin role.
    pub const ADMIN: &'static str = "admin";

    /// Whether this is the admin role.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// The role as sent by the backend.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => Self::ADMIN,
            Self::Other(role) => role,
        }
    }
}

impl From<String> for UserRole {
    fn from(role: String) -> Self {
        if role == Self::ADMIN {
            Self::Admin
        } else {
            Self::Other(role)
        }
    }
}

impl From<&str> for UserRole {
    fn from(role: &str) -> Self {
        Self::from(role.to_owned())
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Admin => UserRole::ADMIN.to_owned(),
            UserRole::Other(role) => role,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
