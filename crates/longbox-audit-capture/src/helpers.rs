//! Field-mapping conveniences over [`AuditLogger::record`].

use crate::logger::{AuditHandle, AuditLogger};
use longbox_audit_types::{AuditAction, AuditActor, AuditContext, AuditEntry, AuditOutcome};
use longbox_common_core::{ComicId, UserId};
use longbox_rbac::{Action, Permission, Resource, Role};
use serde::{Deserialize, Serialize};

/// Authentication events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    Login,
    Logout,
    LoginFailed,
}

impl AuthEvent {
    fn action(self) -> AuditAction {
        match self {
            AuthEvent::Login => AuditAction::Login,
            AuthEvent::Logout => AuditAction::Logout,
            AuthEvent::LoginFailed => AuditAction::LoginFailed,
        }
    }
}

/// Comic record mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComicEvent {
    Created,
    Updated,
    Deleted,
}

impl ComicEvent {
    fn action(self) -> AuditAction {
        match self {
            ComicEvent::Created => AuditAction::ComicCreated,
            ComicEvent::Updated => AuditAction::ComicUpdated,
            ComicEvent::Deleted => AuditAction::ComicDeleted,
        }
    }
}

/// Bulk data transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEvent {
    Import,
    Export,
}

impl TransferEvent {
    fn action(self) -> AuditAction {
        match self {
            TransferEvent::Import => AuditAction::Import,
            TransferEvent::Export => AuditAction::Export,
        }
    }

    fn resource(self) -> Resource {
        match self {
            TransferEvent::Import => Resource::IMPORT,
            TransferEvent::Export => Resource::EXPORT,
        }
    }
}

/// Counts recorded with an import or export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSummary {
    pub records: u64,
    pub errors: u64,
    /// File format, e.g. `csv` or `xlsx`.
    pub format: Option<String>,
}

impl AuditLogger {
    pub fn log_role_change(
        &self,
        actor: &AuditActor,
        target: UserId,
        old_role: Role,
        new_role: Role,
        context: &AuditContext,
    ) -> AuditHandle {
        self.record(
            AuditEntry::builder(AuditAction::RoleChanged, Resource::USERS.as_str())
                .actor(actor.clone())
                .target_user(target)
                .resource_id(target.to_string())
                .context(context)
                .metadata("old_role", old_role)
                .metadata("new_role", new_role)
                .build(),
        )
    }

    pub fn log_user_creation(
        &self,
        actor: &AuditActor,
        target: UserId,
        role: Role,
        context: &AuditContext,
    ) -> AuditHandle {
        self.record(
            AuditEntry::builder(AuditAction::UserCreated, Resource::USERS.as_str())
                .actor(actor.clone())
                .target_user(target)
                .resource_id(target.to_string())
                .context(context)
                .metadata("role", role)
                .build(),
        )
    }

    pub fn log_user_deletion(
        &self,
        actor: &AuditActor,
        target: UserId,
        context: &AuditContext,
    ) -> AuditHandle {
        self.record(
            AuditEntry::builder(AuditAction::UserDeleted, Resource::USERS.as_str())
                .actor(actor.clone())
                .target_user(target)
                .resource_id(target.to_string())
                .context(context)
                .build(),
        )
    }

    /// One `access_denied` entry. `action` is absent when a role check, not a
    /// permission check, failed.
    pub fn log_access_denied(
        &self,
        actor: &AuditActor,
        resource: &str,
        action: Option<Action>,
        reason: &str,
        context: &AuditContext,
    ) -> AuditHandle {
        let mut entry = AuditEntry::builder(AuditAction::AccessDenied, resource)
            .actor(actor.clone())
            .outcome(AuditOutcome::Denied)
            .reason(reason)
            .context(context);
        if let Some(action) = action {
            entry = entry.metadata("attempted_action", action);
        }
        self.record(entry.build())
    }

    /// Login, logout or failed login. `user` is `None` when a login names an
    /// unknown account; the attempted username is kept either way.
    pub fn log_auth_event(
        &self,
        event: AuthEvent,
        user: Option<&AuditActor>,
        username: &str,
        context: &AuditContext,
    ) -> AuditHandle {
        let outcome = match event {
            AuthEvent::LoginFailed => AuditOutcome::Failure,
            AuthEvent::Login | AuthEvent::Logout => AuditOutcome::Success,
        };

        let mut entry = AuditEntry::builder(event.action(), "auth")
            .outcome(outcome)
            .context(context)
            .metadata("username", username);
        entry = match user {
            Some(actor) => entry.actor(actor.clone()),
            None => entry.actor_username(username),
        };
        self.record(entry.build())
    }

    pub fn log_comic_event(
        &self,
        actor: &AuditActor,
        event: ComicEvent,
        comic_id: ComicId,
        outcome: AuditOutcome,
        context: &AuditContext,
    ) -> AuditHandle {
        self.record(
            AuditEntry::builder(event.action(), Resource::COMICS.as_str())
                .actor(actor.clone())
                .resource_id(comic_id.to_string())
                .outcome(outcome)
                .context(context)
                .build(),
        )
    }

    pub fn log_import_export_event(
        &self,
        actor: &AuditActor,
        event: TransferEvent,
        outcome: AuditOutcome,
        summary: &TransferSummary,
        context: &AuditContext,
    ) -> AuditHandle {
        self.record(
            AuditEntry::builder(event.action(), event.resource().as_str())
                .actor(actor.clone())
                .outcome(outcome)
                .context(context)
                .metadata("records", summary.records)
                .metadata("errors", summary.errors)
                .metadata("format", &summary.format)
                .build(),
        )
    }

    /// A dynamic grant matrix edit.
    pub fn log_permission_change(
        &self,
        actor: &AuditActor,
        role: Role,
        permission: &Permission,
        granted: bool,
        context: &AuditContext,
    ) -> AuditHandle {
        self.record(
            AuditEntry::builder(AuditAction::PermissionChanged, permission.resource.as_str())
                .actor(actor.clone())
                .context(context)
                .metadata("role", role)
                .metadata("permission", permission.to_string())
                .metadata("granted", granted)
                .build(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemoryAuditSink;
    use longbox_audit_types::AuditFilter;
    use std::sync::Arc;

    fn logger() -> (AuditLogger, MemoryAuditSink) {
        let sink = MemoryAuditSink::new();
        (AuditLogger::new(Arc::new(sink.clone())), sink)
    }

    fn admin() -> AuditActor {
        AuditActor::new(UserId::new()).with_username("admin")
    }

    fn context() -> AuditContext {
        AuditContext::new(Some("198.51.100.4".into()), Some("Mozilla/5.0".into()))
    }

    #[tokio::test]
    async fn test_role_change() {
        let (logger, sink) = logger();
        let target = UserId::new();
        logger
            .log_role_change(&admin(), target, Role::Viewer, Role::Lister, &context())
            .wait()
            .await;

        let entry = &sink.entries()[0];
        assert_eq!(entry.action, AuditAction::RoleChanged);
        assert_eq!(entry.resource, "users");
        assert_eq!(entry.target_user_id, Some(target));
        assert_eq!(entry.metadata["old_role"], "viewer");
        assert_eq!(entry.metadata["new_role"], "lister");
        assert_eq!(entry.ip_address.as_deref(), Some("198.51.100.4"));
    }

    #[tokio::test]
    async fn test_access_denied() {
        let (logger, sink) = logger();
        logger
            .log_access_denied(
                &admin(),
                "comics",
                Some(Action::Create),
                "Insufficient permissions for role: viewer",
                &context(),
            )
            .wait()
            .await;

        let entry = &sink.entries()[0];
        assert_eq!(entry.outcome, AuditOutcome::Denied);
        assert_eq!(
            entry.reason.as_deref(),
            Some("Insufficient permissions for role: viewer")
        );
        assert_eq!(entry.metadata["attempted_action"], "create");
    }

    #[tokio::test]
    async fn test_failed_login_for_unknown_user() {
        let (logger, sink) = logger();
        logger
            .log_auth_event(AuthEvent::LoginFailed, None, "mallory", &context())
            .wait()
            .await;

        let entry = &sink.entries()[0];
        assert_eq!(entry.action, AuditAction::LoginFailed);
        assert_eq!(entry.outcome, AuditOutcome::Failure);
        assert_eq!(entry.actor_user_id, None);
        assert_eq!(entry.actor_username.as_deref(), Some("mallory"));
    }

    #[tokio::test]
    async fn test_comic_and_transfer_events() {
        let (logger, sink) = logger();
        let actor = admin();
        let comic = ComicId::new();

        logger
            .log_comic_event(&actor, ComicEvent::Updated, comic, AuditOutcome::Success, &context())
            .wait()
            .await;
        logger
            .log_import_export_event(
                &actor,
                TransferEvent::Import,
                AuditOutcome::Failure,
                &TransferSummary {
                    records: 120,
                    errors: 3,
                    format: Some("csv".into()),
                },
                &context(),
            )
            .wait()
            .await;

        let page = logger
            .get_audit_logs(&AuditFilter::new().actor(actor.user_id))
            .await
            .unwrap();
        assert_eq!(page.count, 2);

        let entries = sink.entries();
        assert_eq!(entries[0].resource_id, Some(comic.to_string()));
        assert_eq!(entries[1].resource, "import");
        assert_eq!(entries[1].metadata["errors"], 3);
    }

    #[tokio::test]
    async fn test_permission_change() {
        let (logger, sink) = logger();
        let permission = Permission::new(Resource::REPORTS, Action::Create);
        logger
            .log_permission_change(&admin(), Role::Analyst, &permission, false, &context())
            .wait()
            .await;

        let entry = &sink.entries()[0];
        assert_eq!(entry.action, AuditAction::PermissionChanged);
        assert_eq!(entry.resource, "reports");
        assert_eq!(entry.metadata["permission"], "reports.create");
        assert_eq!(entry.metadata["granted"], false);
    }
}
