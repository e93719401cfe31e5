//! User accounts.

use serde::{Deserialize, Serialize};

use crate::api::{CompanyId, DepartmentId, UserId};
use crate::define_choice_enum;

define_choice_enum!(
    /// Role carried by every account; drives visibility and write access.
    Role {
        Admin => "admin",
        Technician => "technician",
        User => "user",
    }
);

/// Stored account row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    /// `salt$hex(sha256(salt || password))`; never serialized to clients.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub company: Option<CompanyId>,
    pub department: Option<DepartmentId>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_technician(&self) -> bool {
        self.role == Role::Technician
    }
}

/// Insert payload for a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub company: Option<CompanyId>,
    pub department: Option<DepartmentId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_role_text_roundtrip() {
        for role in Role::ALL {
            assert_eq!(Role::from_str(role.as_str()).unwrap(), *role);
        }
        assert!(Role::from_str("superuser").is_err());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: UserId::new(1),
            email: "tech@test.com".to_string(),
            password_hash: "salt$hash".to_string(),
            role: Role::Technician,
            company: None,
            department: None,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "technician");
    }
}
