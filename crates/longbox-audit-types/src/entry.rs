//! The audit log entry.

use crate::action::{AuditAction, AuditOutcome};
use chrono::{DateTime, Utc};
use longbox_common_core::{AuditEntryId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One immutable record of a security-relevant event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    pub timestamp: DateTime<Utc>,
    /// Who performed the action. Absent for failed logins of unknown users.
    pub actor_user_id: Option<UserId>,
    pub actor_username: Option<String>,
    /// The user acted upon, for user-management events.
    pub target_user_id: Option<UserId>,
    pub action: AuditAction,
    /// Protected resource name (`comics`, `users`, ...).
    pub resource: String,
    /// Specific record within the resource, e.g. a comic id.
    pub resource_id: Option<String>,
    pub outcome: AuditOutcome,
    /// Human-readable reason for denials and failures.
    pub reason: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl AuditEntry {
    pub fn builder(action: AuditAction, resource: impl Into<String>) -> AuditEntryBuilder {
        AuditEntryBuilder::new(action, resource)
    }
}

/// The user an entry is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditActor {
    pub user_id: UserId,
    pub username: Option<String>,
}

impl AuditActor {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            username: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

/// Request context attached to entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl AuditContext {
    pub fn new(ip_address: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            ip_address,
            user_agent,
        }
    }
}

/// Builder for [`AuditEntry`].
#[derive(Debug)]
pub struct AuditEntryBuilder {
    action: AuditAction,
    resource: String,
    actor: Option<AuditActor>,
    actor_username: Option<String>,
    target_user_id: Option<UserId>,
    resource_id: Option<String>,
    outcome: AuditOutcome,
    reason: Option<String>,
    context: AuditContext,
    metadata: Map<String, Value>,
}

impl AuditEntryBuilder {
    pub fn new(action: AuditAction, resource: impl Into<String>) -> Self {
        Self {
            action,
            resource: resource.into(),
            actor: None,
            actor_username: None,
            target_user_id: None,
            resource_id: None,
            outcome: AuditOutcome::Success,
            reason: None,
            context: AuditContext::default(),
            metadata: Map::new(),
        }
    }

    pub fn actor(mut self, actor: AuditActor) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Name the actor without a user id, e.g. a failed login for an unknown account.
    pub fn actor_username(mut self, username: impl Into<String>) -> Self {
        self.actor_username = Some(username.into());
        self
    }

    pub fn target_user(mut self, user_id: UserId) -> Self {
        self.target_user_id = Some(user_id);
        self
    }

    pub fn resource_id(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }

    pub fn outcome(mut self, outcome: AuditOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn context(mut self, context: &AuditContext) -> Self {
        self.context = context.clone();
        self
    }

    /// Add a metadata field. Values that fail to serialize are dropped.
    pub fn metadata(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(json) = serde_json::to_value(value) {
            self.metadata.insert(key.into(), json);
        }
        self
    }

    pub fn build(self) -> AuditEntry {
        let (actor_user_id, actor_username) = match self.actor {
            Some(actor) => (Some(actor.user_id), actor.username.or(self.actor_username)),
            None => (None, self.actor_username),
        };

        AuditEntry {
            id: AuditEntryId::new(),
            timestamp: Utc::now(),
            actor_user_id,
            actor_username,
            target_user_id: self.target_user_id,
            action: self.action,
            resource: self.resource,
            resource_id: self.resource_id,
            outcome: self.outcome,
            reason: self.reason,
            ip_address: self.context.ip_address,
            user_agent: self.context.user_agent,
            metadata: self.metadata,
        }
    }
}
