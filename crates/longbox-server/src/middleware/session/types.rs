//! Session types.

use chrono::Utc;
use longbox_audit_types::AuditActor;
use longbox_common_core::UserId;
use longbox_rbac::Role;
use serde::{Deserialize, Serialize};

/// The caller behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
    pub username: String,
    pub full_name: Option<String>,
}

impl Identity {
    pub fn new(user_id: UserId, role: Role, username: impl Into<String>) -> Self {
        Self {
            user_id,
            role,
            username: username.into(),
            full_name: None,
        }
    }

    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }

    /// The audit actor for entries this identity causes.
    pub fn to_actor(&self) -> AuditActor {
        AuditActor::new(self.user_id).with_username(self.username.clone())
    }
}

/// JWT claims carried by the session cookie.
///
/// `role` stays a string so tokens minted before the lister rename, which
/// carry `user`, still decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID, bare UUID).
    pub sub: String,
    pub role: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl SessionClaims {
    /// Claims for `identity` valid for `ttl_secs` from now.
    pub fn new(identity: &Identity, ttl_secs: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: identity.user_id.as_uuid().to_string(),
            role: identity.role.as_str().to_string(),
            username: identity.username.clone(),
            full_name: identity.full_name.clone(),
            iat: now,
            exp: now + ttl_secs,
        }
    }

    /// Decode the claims into an identity. `None` for an unparseable subject or
    /// an unknown role.
    pub fn into_identity(self) -> Option<Identity> {
        let user_id = UserId::parse(&self.sub).ok()?;
        let role = Role::parse(&self.role).ok()?;
        Some(Identity {
            user_id,
            role,
            username: self.username,
            full_name: self.full_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_roundtrip_identity() {
        let identity = Identity::new(UserId::new(), Role::Analyst, "ana").with_full_name("Ana Lyst");
        let claims = SessionClaims::new(&identity, 60);
        assert_eq!(claims.role, "analyst");
        assert_eq!(claims.into_identity(), Some(identity));
    }

    #[test]
    fn test_legacy_user_role_normalizes_to_lister() {
        let identity = Identity::new(UserId::new(), Role::Lister, "old");
        let mut claims = SessionClaims::new(&identity, 60);
        claims.role = "user".into();
        assert_eq!(claims.into_identity().map(|i| i.role), Some(Role::Lister));
    }

    #[test]
    fn test_unknown_role_has_no_identity() {
        let identity = Identity::new(UserId::new(), Role::Viewer, "v");
        let mut claims = SessionClaims::new(&identity, 60);
        claims.role = "superuser".into();
        assert!(claims.into_identity().is_none());
    }

    #[test]
    fn test_actor_carries_username() {
        let identity = Identity::new(UserId::new(), Role::Viewer, "vera");
        let actor = identity.to_actor();
        assert_eq!(actor.user_id, identity.user_id);
        assert_eq!(actor.username.as_deref(), Some("vera"));
    }
}
