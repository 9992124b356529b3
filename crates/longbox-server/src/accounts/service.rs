//! Account administration with audit trail.

use super::directory::UserDirectory;
use super::error::AccountError;
use super::password::{hash_password, verify_password};
use super::types::{NewUser, UserRecord, UserSummary};
use crate::middleware::session::{Identity, SessionIssuer};
use chrono::Utc;
use longbox_audit_capture::{
    AuditAction, AuditActor, AuditContext, AuditEntry, AuditLogger, AuthEvent,
};
use longbox_common_core::UserId;
use longbox_rbac::{Resource, Role};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// A successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub identity: Identity,
    /// Signed session credential for the cookie.
    pub token: String,
}

/// Login, logout and user management.
///
/// Every mutation is audited on its success path. Admins may not change their
/// own role or delete their own account.
#[derive(Clone)]
pub struct AccountService {
    directory: Arc<dyn UserDirectory>,
    audit: AuditLogger,
    sessions: Arc<SessionIssuer>,
}

impl AccountService {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        audit: AuditLogger,
        sessions: Arc<SessionIssuer>,
    ) -> Self {
        Self {
            directory,
            audit,
            sessions,
        }
    }

    pub fn directory(&self) -> &Arc<dyn UserDirectory> {
        &self.directory
    }

    #[instrument(skip(self, password, context))]
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        context: &AuditContext,
    ) -> Result<LoginOutcome, AccountError> {
        let user = self.directory.find_by_username(username).await?;

        let verified = match &user {
            Some(user) => check_password(&user.password_hash, password).await,
            None => false,
        };

        match user {
            Some(user) if verified => {
                let identity = identity_of(&user);
                let token = self.sessions.issue(&identity)?;
                self.audit
                    .log_auth_event(AuthEvent::Login, Some(&identity.to_actor()), &user.username, context)
                    .detach();
                info!(user_id = %user.id, role = %user.role, "User logged in");
                Ok(LoginOutcome { identity, token })
            }
            user => {
                let actor = user.map(|u| AuditActor::new(u.id).with_username(u.username));
                self.audit
                    .log_auth_event(AuthEvent::LoginFailed, actor.as_ref(), username, context)
                    .detach();
                warn!(event = "login_failed", username, "Login failed");
                Err(AccountError::InvalidCredentials)
            }
        }
    }

    /// Record a logout. Logging out without a session is not an error.
    pub async fn logout(&self, identity: Option<&Identity>, context: &AuditContext) {
        if let Some(identity) = identity {
            self.audit
                .log_auth_event(
                    AuthEvent::Logout,
                    Some(&identity.to_actor()),
                    &identity.username,
                    context,
                )
                .detach();
            info!(user_id = %identity.user_id, "User logged out");
        }
    }

    pub async fn list_users(&self) -> Result<Vec<UserSummary>, AccountError> {
        let users = self.directory.list().await?;
        Ok(users.iter().map(UserSummary::from).collect())
    }

    #[instrument(skip(self, actor, new_user, context), fields(actor = %actor.user_id, username = %new_user.username))]
    pub async fn create_user(
        &self,
        actor: &Identity,
        new_user: NewUser,
        context: &AuditContext,
    ) -> Result<UserRecord, AccountError> {
        new_user.validate().map_err(AccountError::Invalid)?;

        let user = self.build_record(new_user).await?;
        self.directory.insert(&user).await?;

        self.audit
            .log_user_creation(&actor.to_actor(), user.id, user.role, context)
            .detach();
        info!(user_id = %user.id, role = %user.role, "User created");
        Ok(user)
    }

    #[instrument(skip(self, actor, context), fields(actor = %actor.user_id))]
    pub async fn change_role(
        &self,
        actor: &Identity,
        target: UserId,
        role: Role,
        context: &AuditContext,
    ) -> Result<UserRecord, AccountError> {
        if actor.user_id == target {
            return Err(AccountError::SelfRoleChange);
        }

        let mut user = self
            .directory
            .find_by_id(target)
            .await?
            .ok_or(AccountError::NotFound(target))?;
        let old_role = user.role;
        if old_role == role {
            return Ok(user);
        }

        if !self.directory.update_role(target, role).await? {
            return Err(AccountError::NotFound(target));
        }
        user.role = role;
        user.updated_at = Utc::now();

        self.audit
            .log_role_change(&actor.to_actor(), target, old_role, role, context)
            .detach();
        info!(user_id = %target, %old_role, new_role = %role, "Role changed");
        Ok(user)
    }

    #[instrument(skip(self, actor, context), fields(actor = %actor.user_id))]
    pub async fn delete_user(
        &self,
        actor: &Identity,
        target: UserId,
        context: &AuditContext,
    ) -> Result<(), AccountError> {
        if actor.user_id == target {
            return Err(AccountError::SelfDeletion);
        }

        if !self.directory.delete(target).await? {
            return Err(AccountError::NotFound(target));
        }

        self.audit
            .log_user_deletion(&actor.to_actor(), target, context)
            .detach();
        info!(user_id = %target, "User deleted");
        Ok(())
    }

    /// Create the first administrator when there are no users at all.
    /// Returns `None` when users already exist.
    pub async fn bootstrap_admin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserRecord>, AccountError> {
        if self.directory.count().await? > 0 {
            return Ok(None);
        }

        let new_user = NewUser {
            username: username.to_string(),
            password: password.to_string(),
            full_name: Some("Administrator".to_string()),
            role: Role::Admin,
        };
        new_user.validate().map_err(AccountError::Invalid)?;

        let user = self.build_record(new_user).await?;
        self.directory.insert(&user).await?;

        self.audit
            .record(
                AuditEntry::builder(AuditAction::UserCreated, Resource::USERS.as_str())
                    .actor_username("system")
                    .target_user(user.id)
                    .resource_id(user.id.to_string())
                    .metadata("role", Role::Admin)
                    .metadata("bootstrap", true)
                    .build(),
            )
            .detach();
        info!(user_id = %user.id, username = %user.username, "Bootstrap administrator created");
        Ok(Some(user))
    }

    async fn build_record(&self, new_user: NewUser) -> Result<UserRecord, AccountError> {
        let password = new_user.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AccountError::Hash(e.to_string()))??;

        let now = Utc::now();
        Ok(UserRecord {
            id: UserId::new(),
            username: new_user.username.trim().to_string(),
            password_hash,
            full_name: new_user.full_name.filter(|name| !name.trim().is_empty()),
            role: new_user.role,
            created_at: now,
            updated_at: now,
        })
    }
}

impl std::fmt::Debug for AccountService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountService").finish_non_exhaustive()
    }
}

fn identity_of(user: &UserRecord) -> Identity {
    Identity {
        user_id: user.id,
        role: user.role,
        username: user.username.clone(),
        full_name: user.full_name.clone(),
    }
}

async fn check_password(hash: &str, password: &str) -> bool {
    let hash = hash.to_string();
    let password = password.to_string();
    tokio::task::spawn_blocking(move || verify_password(&hash, &password))
        .await
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::SqliteUserDirectory;
    use longbox_audit_capture::{
        AuditError, AuditFilter, AuditOutcome, AuditPage, AuditSink, MemoryAuditSink,
    };
    use longbox_common_config::SessionConfig;
    use longbox_database::PoolConfig;
    use longbox_test_utils::eventually;
    use std::time::Duration;

    struct Fixture {
        service: AccountService,
        sink: MemoryAuditSink,
        sessions: Arc<SessionIssuer>,
    }

    async fn fixture() -> Fixture {
        let db = longbox_database::open(PoolConfig::in_memory()).await.unwrap();
        let sink = MemoryAuditSink::new();
        let sessions = Arc::new(SessionIssuer::new(&SessionConfig {
            secret: "test_secret_key_that_is_32_chars!".into(),
            ..SessionConfig::default()
        }));
        let service = AccountService::new(
            Arc::new(SqliteUserDirectory::new(db.pool().clone())),
            AuditLogger::new(Arc::new(sink.clone())),
            sessions.clone(),
        );
        Fixture {
            service,
            sink,
            sessions,
        }
    }

    /// The sink's entries once `len` background writes have landed.
    async fn settled(sink: &MemoryAuditSink, len: usize) -> Vec<AuditEntry> {
        let landed = eventually(|| {
            let sink = sink.clone();
            async move { sink.len() >= len }
        })
        .await;
        assert!(landed, "expected {len} audit entries, found {}", sink.len());
        sink.entries()
    }

    fn admin() -> Identity {
        Identity::new(UserId::new(), Role::Admin, "root")
    }

    fn new_user(username: &str, role: Role) -> NewUser {
        NewUser {
            username: username.into(),
            password: "password123".into(),
            full_name: None,
            role,
        }
    }

    #[tokio::test]
    async fn test_create_user_is_audited() {
        let f = fixture().await;
        let actor = admin();
        let user = f
            .service
            .create_user(&actor, new_user("lou", Role::Lister), &AuditContext::default())
            .await
            .unwrap();

        let entries = settled(&f.sink, 1).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, AuditAction::UserCreated);
        assert_eq!(entries[0].actor_user_id, Some(actor.user_id));
        assert_eq!(entries[0].target_user_id, Some(user.id));
    }

    #[tokio::test]
    async fn test_login_success_and_failure() {
        let f = fixture().await;
        f.service
            .create_user(&admin(), new_user("vera", Role::Viewer), &AuditContext::default())
            .await
            .unwrap();

        let outcome = f
            .service
            .login("VERA", "password123", &AuditContext::default())
            .await
            .unwrap();
        assert_eq!(outcome.identity.role, Role::Viewer);
        assert_eq!(f.sessions.decode(&outcome.token), Some(outcome.identity));

        let err = f
            .service
            .login("vera", "wrong-password", &AuditContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidCredentials));

        let err = f
            .service
            .login("nobody", "password123", &AuditContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidCredentials));

        let entries = settled(&f.sink, 4).await;
        let actions: Vec<_> = entries.iter().map(|e| (e.action, e.outcome)).collect();
        assert_eq!(
            actions,
            vec![
                (AuditAction::UserCreated, AuditOutcome::Success),
                (AuditAction::Login, AuditOutcome::Success),
                (AuditAction::LoginFailed, AuditOutcome::Failure),
                (AuditAction::LoginFailed, AuditOutcome::Failure),
            ]
        );
        let unknown = &entries[3];
        assert_eq!(unknown.actor_user_id, None);
        assert_eq!(unknown.actor_username.as_deref(), Some("nobody"));
    }

    #[tokio::test]
    async fn test_self_role_change_and_self_delete_rejected() {
        let f = fixture().await;
        let actor = admin();

        let err = f
            .service
            .change_role(&actor, actor.user_id, Role::Viewer, &AuditContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::SelfRoleChange));

        let err = f
            .service
            .delete_user(&actor, actor.user_id, &AuditContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::SelfDeletion));
        assert!(f.sink.is_empty());
    }

    #[tokio::test]
    async fn test_change_role_records_old_and_new() {
        let f = fixture().await;
        let actor = admin();
        let user = f
            .service
            .create_user(&actor, new_user("ana", Role::Viewer), &AuditContext::default())
            .await
            .unwrap();

        let updated = f
            .service
            .change_role(&actor, user.id, Role::Analyst, &AuditContext::default())
            .await
            .unwrap();
        assert_eq!(updated.role, Role::Analyst);

        let entry = settled(&f.sink, 2).await.pop().unwrap();
        assert_eq!(entry.action, AuditAction::RoleChanged);
        assert_eq!(entry.metadata["old_role"], "viewer");
        assert_eq!(entry.metadata["new_role"], "analyst");
    }

    #[tokio::test]
    async fn test_delete_unknown_user() {
        let f = fixture().await;
        let err = f
            .service
            .delete_user(&admin(), UserId::new(), &AuditContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_bootstrap_admin_only_on_empty_directory() {
        let f = fixture().await;
        let created = f.service.bootstrap_admin("admin", "changeme-now").await.unwrap();
        assert_eq!(created.map(|u| u.role), Some(Role::Admin));

        let again = f.service.bootstrap_admin("admin2", "changeme-now").await.unwrap();
        assert!(again.is_none());
        assert_eq!(settled(&f.sink, 1).await.len(), 1);
    }

    /// A sink whose writes never complete.
    struct HangingSink;

    #[async_trait::async_trait]
    impl AuditSink for HangingSink {
        fn name(&self) -> &'static str {
            "hanging"
        }

        async fn append(&self, _: &AuditEntry) -> Result<(), AuditError> {
            std::future::pending().await
        }

        async fn query(&self, _: &AuditFilter, _: u32, _: u32) -> Result<AuditPage, AuditError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_hung_audit_store_does_not_block_account_operations() {
        let db = longbox_database::open(PoolConfig::in_memory()).await.unwrap();
        let directory = Arc::new(SqliteUserDirectory::new(db.pool().clone()));
        let service = AccountService::new(
            directory.clone(),
            AuditLogger::new(Arc::new(HangingSink)),
            Arc::new(SessionIssuer::new(&SessionConfig {
                secret: "test_secret_key_that_is_32_chars!".into(),
                ..SessionConfig::default()
            })),
        );
        let actor = admin();
        let within = Duration::from_secs(2);
        let ctx = AuditContext::default();

        let user = tokio::time::timeout(within, service.create_user(&actor, new_user("lou", Role::Lister), &ctx))
            .await
            .expect("create_user returned while the audit write hangs")
            .unwrap();
        tokio::time::timeout(within, service.login("lou", "password123", &ctx))
            .await
            .expect("login returned while the audit write hangs")
            .unwrap();
        tokio::time::timeout(within, service.change_role(&actor, user.id, Role::Viewer, &ctx))
            .await
            .expect("change_role returned while the audit write hangs")
            .unwrap();
        tokio::time::timeout(within, service.delete_user(&actor, user.id, &ctx))
            .await
            .expect("delete_user returned while the audit write hangs")
            .unwrap();

        assert_eq!(directory.count().await.unwrap(), 0);
    }
}
