//! Roles and the authorization predicate shared by every service
//!
//! Handlers never compare role names themselves. They name the [`Action`]
//! they are about to perform and ask [`authorize`].

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Coarse authorization category attached to a user record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
    Analyst,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Admin, Role::Analyst];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Analyst => "analyst",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised role name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "analyst" => Ok(Role::Analyst),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// Operations gated by role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ViewRecords,
    EditRecords,
    UseAssistant,
    ViewOwnAccount,
    ViewAllUsers,
    ManageRoles,
}

/// Whether `role` may perform `action`
pub fn authorize(role: Role, action: Action) -> bool {
    match action {
        Action::ViewAllUsers | Action::ManageRoles => role == Role::Admin,
        Action::ViewRecords | Action::EditRecords | Action::UseAssistant | Action::ViewOwnAccount => {
            true
        }
    }
}

/// Returned when a role is not permitted to perform an action
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("role '{role}' may not perform {action:?}")]
pub struct Forbidden {
    pub role: Role,
    pub action: Action,
}
