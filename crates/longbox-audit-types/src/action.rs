//! Audited actions and outcomes.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Kinds of audited event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, AsRefStr, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuditAction {
    // Authorization
    AccessDenied,
    PermissionChanged,

    // Authentication
    Login,
    Logout,
    LoginFailed,

    // User management
    UserCreated,
    UserDeleted,
    RoleChanged,

    // Catalog
    ComicCreated,
    ComicUpdated,
    ComicDeleted,

    // Data transfer
    Import,
    Export,
}

impl AuditAction {
    /// Whether this action is an authentication event.
    pub fn is_auth_event(&self) -> bool {
        matches!(self, Self::Login | Self::Logout | Self::LoginFailed)
    }

    pub fn is_comic_event(&self) -> bool {
        matches!(
            self,
            Self::ComicCreated | Self::ComicUpdated | Self::ComicDeleted
        )
    }

    pub fn is_transfer_event(&self) -> bool {
        matches!(self, Self::Import | Self::Export)
    }
}

/// Outcome of an audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AuditOutcome {
    #[default]
    Success,
    Failure,
    Denied,
}

impl AuditOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use test_case::test_case;

    #[test_case(AuditAction::AccessDenied, "access_denied")]
    #[test_case(AuditAction::LoginFailed, "login_failed")]
    #[test_case(AuditAction::RoleChanged, "role_changed")]
    #[test_case(AuditAction::Import, "import")]
    fn test_action_names(action: AuditAction, name: &str) {
        assert_eq!(action.to_string(), name);
        assert_eq!(AuditAction::from_str(name).unwrap(), action);
        assert_eq!(serde_json::to_string(&action).unwrap(), format!("\"{name}\""));
    }

    #[test]
    fn test_outcome_names() {
        assert_eq!(AuditOutcome::Denied.as_ref(), "denied");
        assert_eq!(AuditOutcome::from_str("failure").unwrap(), AuditOutcome::Failure);
        assert!(AuditOutcome::from_str("maybe").is_err());
    }

    #[test]
    fn test_event_groups() {
        assert!(AuditAction::LoginFailed.is_auth_event());
        assert!(!AuditAction::AccessDenied.is_auth_event());
        assert!(AuditAction::ComicDeleted.is_comic_event());
        assert!(AuditAction::Export.is_transfer_event());
    }
}
