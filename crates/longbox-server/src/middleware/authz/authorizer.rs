//! The authorization check.

use super::types::{AuthzConfig, AuthzConfigError, AuthzVerdict};
use crate::error::ApiError;
use crate::middleware::session::{Identity, RequestContext, SessionResolver};
use axum::{
    body::Body,
    http::{request::Parts, Request},
    response::{IntoResponse, Response},
};
use longbox_audit_capture::AuditLogger;
use longbox_rbac::{Action, PermissionEvaluator};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Combines session resolution, permission evaluation and audit-on-denial.
#[derive(Clone)]
pub struct Authorizer {
    resolver: Arc<dyn SessionResolver>,
    evaluator: Arc<PermissionEvaluator>,
    audit: AuditLogger,
}

impl Authorizer {
    pub fn new(
        resolver: Arc<dyn SessionResolver>,
        evaluator: Arc<PermissionEvaluator>,
        audit: AuditLogger,
    ) -> Self {
        Self {
            resolver,
            evaluator,
            audit,
        }
    }

    pub fn evaluator(&self) -> &Arc<PermissionEvaluator> {
        &self.evaluator
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Resolve the caller without checking anything.
    pub async fn resolve_identity(&self, parts: &Parts) -> Option<Identity> {
        self.resolver.resolve_identity(parts).await
    }

    /// Decide whether the request may proceed.
    ///
    /// Only a malformed `config` is an `Err`, and it is reported before the
    /// session is looked at. Unauthenticated and denied requests are verdicts.
    /// A denial of a resolved caller has been written to the audit log by the
    /// time this returns, unless the write outlasts the logger's
    /// `write_timeout`, in which case it finishes in the background.
    pub async fn authorize(
        &self,
        parts: &Parts,
        config: &AuthzConfig,
    ) -> Result<AuthzVerdict, AuthzConfigError> {
        config.validate()?;

        let Some(identity) = self.resolver.resolve_identity(parts).await else {
            debug!(path = %parts.uri.path(), "No session on protected request");
            return Ok(AuthzVerdict::unauthenticated());
        };

        if config.admin_bypass && identity.role.is_admin() {
            return Ok(AuthzVerdict::allow(identity));
        }

        if let Some(required) = config.required_role {
            if identity.role != required {
                let reason = format!("Required role: {}, user has: {}", required, identity.role);
                let resource = config
                    .required_permissions
                    .first()
                    .map(|p| p.resource.as_str())
                    .unwrap_or_else(|| parts.uri.path());
                return Ok(self.deny(parts, identity, resource, None, reason).await);
            }
        }

        let required = &config.required_permissions;
        if !required.is_empty() {
            let failed = if config.require_all {
                self.evaluator.first_denied(identity.role, required).await
            } else if self.evaluator.has_any_permission(identity.role, required).await {
                None
            } else {
                required.first()
            };
            if let Some(permission) = failed {
                let reason = format!("Insufficient permissions for role: {}", identity.role);
                return Ok(self
                    .deny(
                        parts,
                        identity,
                        permission.resource.as_str(),
                        Some(permission.action),
                        reason,
                    )
                    .await);
            }
        }

        Ok(AuthzVerdict::allow(identity))
    }

    /// Run [`authorize`](Self::authorize) on a whole request. On approval the
    /// identity is placed in the request extensions and returned alongside it;
    /// otherwise the rendered rejection comes back.
    pub async fn admit(
        &self,
        request: Request<Body>,
        config: &AuthzConfig,
    ) -> Result<(Identity, Request<Body>), Response> {
        let (parts, body) = request.into_parts();

        let verdict = match self.authorize(&parts, config).await {
            Ok(verdict) => verdict,
            Err(err) => {
                error!(error = %err, path = %parts.uri.path(), "Invalid authorization config");
                return Err(ApiError::Internal(err.into()).into_response());
            }
        };

        match verdict.into_result() {
            Ok(identity) => {
                let mut request = Request::from_parts(parts, body);
                request.extensions_mut().insert(identity.clone());
                Ok((identity, request))
            }
            Err(err) => Err(err.into_response()),
        }
    }

    /// `action` is the permission check that failed; absent for role checks.
    async fn deny(
        &self,
        parts: &Parts,
        identity: Identity,
        resource: &str,
        action: Option<Action>,
        reason: String,
    ) -> AuthzVerdict {
        warn!(
            event = "access_denied",
            user_id = %identity.user_id,
            role = %identity.role,
            resource = %resource,
            reason = %reason,
            "Access denied"
        );

        let context = RequestContext::from_parts(parts).to_audit();
        self.audit
            .log_access_denied(&identity.to_actor(), resource, action, &reason, &context)
            .wait_for(self.audit.config().write_timeout)
            .await;

        AuthzVerdict::deny(identity, reason)
    }
}

impl std::fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorizer")
            .field("evaluator", &self.evaluator)
            .finish_non_exhaustive()
    }
}
