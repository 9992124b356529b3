//! Authorization requirements and verdicts.

use crate::error::ApiError;
use crate::middleware::session::Identity;
use longbox_rbac::{Permission, RbacError, Role};
use serde::Serialize;
use thiserror::Error;

/// A malformed [`AuthzConfig`]. Always a programming error.
#[derive(Debug, Error)]
pub enum AuthzConfigError {
    #[error("invalid required permission: {0}")]
    Permission(#[from] RbacError),
}

/// What a request must satisfy.
///
/// With nothing required, any resolved identity passes. Admins pass every
/// check unless [`without_admin_bypass`](Self::without_admin_bypass) is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthzConfig {
    /// Exact role match. Roles have no ordering.
    pub required_role: Option<Role>,
    pub required_permissions: Vec<Permission>,
    /// All of `required_permissions` rather than any one.
    pub require_all: bool,
    pub admin_bypass: bool,
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            required_role: None,
            required_permissions: Vec::new(),
            require_all: false,
            admin_bypass: true,
        }
    }
}

impl AuthzConfig {
    /// Any authenticated caller.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require_role(mut self, role: Role) -> Self {
        self.required_role = Some(role);
        self
    }

    pub fn require_permission(mut self, permission: Permission) -> Self {
        self.required_permissions.push(permission);
        self
    }

    pub fn require_all(mut self) -> Self {
        self.require_all = true;
        self
    }

    pub fn without_admin_bypass(mut self) -> Self {
        self.admin_bypass = false;
        self
    }

    /// Reject permissions a known resource cannot support, e.g. `reports.delete`.
    pub fn validate(&self) -> Result<(), AuthzConfigError> {
        for permission in &self.required_permissions {
            permission.ensure_supported()?;
        }
        Ok(())
    }
}

/// Outcome of [`Authorizer::authorize`](super::Authorizer::authorize).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthzVerdict {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<Identity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthzVerdict {
    pub const UNAUTHENTICATED: &'static str = "Authentication required";

    pub fn allow(identity: Identity) -> Self {
        Self {
            allowed: true,
            identity: Some(identity),
            error: None,
        }
    }

    pub fn unauthenticated() -> Self {
        Self {
            allowed: false,
            identity: None,
            error: Some(Self::UNAUTHENTICATED.to_string()),
        }
    }

    pub fn deny(identity: Identity, reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            identity: Some(identity),
            error: Some(reason.into()),
        }
    }

    /// The approved identity, or the error to render: 401 without an
    /// identity, 403 with one.
    pub fn into_result(self) -> Result<Identity, ApiError> {
        match (self.allowed, self.identity) {
            (true, Some(identity)) => Ok(identity),
            (_, None) => Err(ApiError::Unauthenticated),
            (false, Some(_)) => Err(ApiError::access_denied(
                self.error.unwrap_or_else(|| "Access denied".to_string()),
            )),
        }
    }
}
