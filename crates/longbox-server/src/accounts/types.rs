//! Account types.

use chrono::{DateTime, Utc};
use longbox_common_core::UserId;
use longbox_rbac::Role;
use serde::{Deserialize, Serialize};

/// A stored user, including the password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What the admin API shows about a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub full_name: Option<String>,
    pub role: Role,
    pub role_display_name: &'static str,
    pub created_at: DateTime<Utc>,
}

impl From<&UserRecord> for UserSummary {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
            role_display_name: user.role.describe().display_name,
            created_at: user.created_at,
        }
    }
}

/// Request to create a user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub role: Role,
}

impl NewUser {
    pub const MIN_PASSWORD_LEN: usize = 8;

    pub fn validate(&self) -> Result<(), String> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err("username must not be empty".into());
        }
        if username.len() > 64 {
            return Err("username must be at most 64 characters".into());
        }
        if username.chars().any(char::is_whitespace) {
            return Err("username must not contain whitespace".into());
        }
        if self.password.len() < Self::MIN_PASSWORD_LEN {
            return Err(format!(
                "password must be at least {} characters",
                Self::MIN_PASSWORD_LEN
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, password: &str) -> NewUser {
        NewUser {
            username: username.into(),
            password: password.into(),
            full_name: None,
            role: Role::Viewer,
        }
    }

    #[test]
    fn test_validate() {
        assert!(new_user("vera", "longenough").validate().is_ok());
        assert!(new_user("", "longenough").validate().is_err());
        assert!(new_user("ve ra", "longenough").validate().is_err());
        assert!(new_user("vera", "short").validate().is_err());
    }

    #[test]
    fn test_new_user_accepts_legacy_role() {
        let user: NewUser = serde_json::from_value(serde_json::json!({
            "username": "old",
            "password": "longenough",
            "role": "user"
        }))
        .unwrap();
        assert_eq!(user.role, Role::Lister);
    }
}
