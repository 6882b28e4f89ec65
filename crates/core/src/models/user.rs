//! Registered users, as listed by the admin-only `/usuarios` endpoint.

use serde::{Deserialize, Serialize};

use crate::types::{UserId, UserRole};

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    #[serde(rename = "nome", default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Backend-declared role. Authoritative only on the backend.
    #[serde(rename = "tipo")]
    pub role: UserRole,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_user() {
        let json = r#"{"_id":"u1","nome":"Ana","email":"ana@flora.test","tipo":"admin"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert!(user.role.is_admin());
        assert_eq!(user.name, "Ana");
    }
}
