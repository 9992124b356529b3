//! Audit log queries.

use crate::action::{AuditAction, AuditOutcome};
use crate::entry::AuditEntry;
use chrono::{DateTime, Utc};
use longbox_common_core::UserId;
use serde::{Deserialize, Serialize};

/// Page size when none is requested.
pub const DEFAULT_PAGE_SIZE: u32 = 50;
/// Largest page a query may return.
pub const MAX_PAGE_SIZE: u32 = 500;

/// Criteria for an audit log query. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditFilter {
    pub actor_user_id: Option<UserId>,
    pub target_user_id: Option<UserId>,
    pub action: Option<AuditAction>,
    pub resource: Option<String>,
    pub outcome: Option<AuditOutcome>,
    /// Inclusive lower bound.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound.
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl AuditFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actor(mut self, user_id: UserId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    pub fn target(mut self, user_id: UserId) -> Self {
        self.target_user_id = Some(user_id);
        self
    }

    pub fn action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn outcome(mut self, outcome: AuditOutcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    pub fn between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn page(mut self, limit: u32, offset: u32) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }

    /// Requested limit, defaulted and clamped to `1..=max`.
    pub fn effective_limit(&self, default: u32, max: u32) -> u32 {
        self.limit.unwrap_or(default).clamp(1, max.max(1))
    }

    pub fn effective_offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }

    /// Whether an entry satisfies every criterion. Ignores pagination.
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        self.actor_user_id
            .map_or(true, |id| entry.actor_user_id == Some(id))
            && self
                .target_user_id
                .map_or(true, |id| entry.target_user_id == Some(id))
            && self.action.map_or(true, |action| entry.action == action)
            && self
                .resource
                .as_deref()
                .map_or(true, |resource| entry.resource == resource)
            && self.outcome.map_or(true, |outcome| entry.outcome == outcome)
            && self.from.map_or(true, |from| entry.timestamp >= from)
            && self.to.map_or(true, |to| entry.timestamp < to)
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditPage {
    /// Entries on this page, newest first.
    pub data: Vec<AuditEntry>,
    /// Total entries matching the filter, before pagination.
    pub count: u64,
}

impl AuditPage {
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::AuditActor;
    use chrono::Duration;

    #[test]
    fn test_effective_limit() {
        let filter = AuditFilter::new();
        assert_eq!(filter.effective_limit(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE), 50);
        assert_eq!(
            filter.clone().page(10_000, 0).effective_limit(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE),
            500
        );
        assert_eq!(
            filter.page(0, 0).effective_limit(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE),
            1
        );
    }

    #[test]
    fn test_matches() {
        let alice = UserId::new();
        let entry = AuditEntry::builder(AuditAction::AccessDenied, "comics")
            .actor(AuditActor::new(alice))
            .outcome(AuditOutcome::Denied)
            .build();

        assert!(AuditFilter::new().matches(&entry));
        assert!(AuditFilter::new().actor(alice).matches(&entry));
        assert!(!AuditFilter::new().actor(UserId::new()).matches(&entry));
        assert!(AuditFilter::new()
            .action(AuditAction::AccessDenied)
            .resource("comics")
            .outcome(AuditOutcome::Denied)
            .matches(&entry));
        assert!(!AuditFilter::new().resource("users").matches(&entry));
        assert!(!AuditFilter::new().target(alice).matches(&entry));
    }

    #[test]
    fn test_time_range() {
        let entry = AuditEntry::builder(AuditAction::Login, "auth").build();
        let before = entry.timestamp - Duration::seconds(1);
        let after = entry.timestamp + Duration::seconds(1);

        assert!(AuditFilter::new().between(Some(before), Some(after)).matches(&entry));
        assert!(AuditFilter::new()
            .between(Some(entry.timestamp), None)
            .matches(&entry));
        assert!(!AuditFilter::new()
            .between(None, Some(entry.timestamp))
            .matches(&entry));
    }
}
