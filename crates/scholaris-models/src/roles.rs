//! The closed set of user roles.
//!
//! Roles are parsed once at the authentication boundary. Everything downstream
//! matches on [`Role`] instead of comparing strings, so a new role forces every
//! authorization match to be revisited.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    SchoolAdmin,
    Teacher,
    Parent,
    Finance,
    CanteenStaff,
    BusSupervisor,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::SuperAdmin,
        Role::SchoolAdmin,
        Role::Teacher,
        Role::Parent,
        Role::Finance,
        Role::CanteenStaff,
        Role::BusSupervisor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::SchoolAdmin => "school_admin",
            Role::Teacher => "teacher",
            Role::Parent => "parent",
            Role::Finance => "finance",
            Role::CanteenStaff => "canteen_staff",
            Role::BusSupervisor => "bus_supervisor",
        }
    }

    pub fn is_super_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }

    /// Employees of a school, as opposed to parents.
    pub fn is_staff(&self) -> bool {
        !matches!(self, Role::Parent)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role: {}", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    /// Accepts any casing and `-` or `_` separators (`SCHOOL_ADMIN`,
    /// `school-admin`, `School_Admin`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("SCHOOL_ADMIN".parse::<Role>(), Ok(Role::SchoolAdmin));
        assert_eq!("canteen-staff".parse::<Role>(), Ok(Role::CanteenStaff));
        assert_eq!(" Super_Admin ".parse::<Role>(), Ok(Role::SuperAdmin));
        assert!("principal".parse::<Role>().is_err());
    }

    #[test]
    fn test_display_matches_parse() {
        for role in Role::ALL {
            assert_eq!(role.to_string().parse::<Role>(), Ok(role));
        }
    }

    #[test]
    fn test_serde_snake_case() {
        assert_eq!(
            serde_json::to_value(Role::BusSupervisor).unwrap(),
            "bus_supervisor"
        );
    }

    #[test]
    fn test_staff_and_super_admin() {
        assert!(Role::SuperAdmin.is_super_admin());
        assert!(!Role::SchoolAdmin.is_super_admin());
        assert!(Role::Finance.is_staff());
        assert!(!Role::Parent.is_staff());
    }
}
