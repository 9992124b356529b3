//! Roles.

use crate::error::RbacError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A user's role. Every user holds exactly one.
///
/// Roles carry no implicit ordering: every permission is an explicit grant.
/// The historical literal `user` parses as [`Role::Lister`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[serde(alias = "user")]
    Lister,
    Analyst,
    Viewer,
}

/// Display metadata for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDescription {
    pub display_name: &'static str,
    pub description: &'static str,
}

impl Role {
    /// Every role.
    pub const ALL: [Role; 4] = [Role::Admin, Role::Lister, Role::Analyst, Role::Viewer];

    /// Legacy literal accepted as an alias for [`Role::Lister`].
    pub const LEGACY_LISTER_ALIAS: &'static str = "user";

    pub fn all() -> impl Iterator<Item = Role> {
        Self::ALL.into_iter()
    }

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Lister => "lister",
            Role::Analyst => "analyst",
            Role::Viewer => "viewer",
        }
    }

    /// Parse a role name, accepting the legacy `user` alias. Case-insensitive.
    pub fn parse(name: &str) -> Result<Role, RbacError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "lister" | Self::LEGACY_LISTER_ALIAS => Ok(Role::Lister),
            "analyst" => Ok(Role::Analyst),
            "viewer" => Ok(Role::Viewer),
            _ => Err(RbacError::UnknownRole(name.to_string())),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn describe(&self) -> RoleDescription {
        match self {
            Role::Admin => RoleDescription {
                display_name: "Administrator",
                description: "Full access to all features, including user management and settings",
            },
            Role::Lister => RoleDescription {
                display_name: "Lister",
                description: "Creates and manages comic listings, imports, exports and publishing",
            },
            Role::Analyst => RoleDescription {
                display_name: "Analyst",
                description: "Read-only access to catalog data with report generation",
            },
            Role::Viewer => RoleDescription {
                display_name: "Viewer",
                description: "Read-only access to the catalog",
            },
        }
    }
}

/// Display metadata for a role name. Fails for anything but the four roles
/// (and the legacy `user` alias, which describes the lister role).
pub fn describe_role(name: &str) -> Result<RoleDescription, RbacError> {
    Role::parse(name).map(|role| role.describe())
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RbacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s)
    }
}
