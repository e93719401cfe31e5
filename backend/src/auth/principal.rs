//! The authenticated caller of a single request.

use serde::{Deserialize, Serialize};

use crate::api::{CompanyId, DepartmentId, Role, User, UserId};

/// Identity resolved from a bearer token for the duration of one request.
///
/// Handlers receive it by value and pass it down to services; nothing is
/// stored globally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
    pub company: Option<CompanyId>,
    pub department: Option<DepartmentId>,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_technician(&self) -> bool {
        self.role == Role::Technician
    }

    /// Both sides must name a department; two missing departments do not match.
    pub fn shares_department(&self, department: Option<DepartmentId>) -> bool {
        matches!((self.department, department), (Some(mine), Some(theirs)) if mine == theirs)
    }

    pub fn belongs_to(&self, company: CompanyId) -> bool {
        self.company == Some(company)
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
            company: user.company,
            department: user.department,
        }
    }
}
