//! Users and the authenticated caller identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::ids::{SchoolId, UserId};
use crate::roles::Role;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct School {
    pub id: SchoolId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub school_id: Option<SchoolId>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// The authenticated caller, as loaded from storage for the current request.
///
/// Non-super-admins always carry a school; the auth extractor refuses to build
/// an identity otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub id: UserId,
    pub email: String,
    pub role: Role,
    pub school_id: Option<SchoolId>,
    pub is_active: bool,
}

impl Identity {
    pub fn is_super_admin(&self) -> bool {
        self.role.is_super_admin()
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }
}

impl From<User> for Identity {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            school_id: user.school_id,
            is_active: user.is_active,
        }
    }
}
