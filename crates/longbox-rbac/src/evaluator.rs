//! The permission evaluator.

use crate::error::RbacError;
use crate::matrix::PermissionMatrix;
use crate::permission::{Action, Permission, Resource};
use crate::role::Role;
use crate::store::{MemoryPermissionStore, PermissionStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Which policy answers permission checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RbacMode {
    /// Hardcoded legacy policy. Never touches the store.
    Legacy,
    /// Dynamic grant matrix from the store.
    Enforced,
}

impl RbacMode {
    /// Map the server-side RBAC flag to a mode.
    pub fn from_flag(enabled: bool) -> Self {
        if enabled {
            RbacMode::Enforced
        } else {
            RbacMode::Legacy
        }
    }
}

impl fmt::Display for RbacMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RbacMode::Legacy => "legacy",
            RbacMode::Enforced => "enforced",
        })
    }
}

/// Answers "may role R perform action A on resource X?".
///
/// Admins are always allowed, without consulting either policy, so a missing
/// or corrupted grant row can never lock an administrator out. In enforced
/// mode a missing row is a denial and a store failure is a denial: the
/// evaluator fails closed. Store failures are counted and logged for
/// operators but look like any other denial to callers.
///
/// There is no cache. Every enforced-mode check reads the store, so grant
/// edits are visible to the next call.
pub struct PermissionEvaluator {
    mode: RbacMode,
    store: Arc<dyn PermissionStore>,
    faults: AtomicU64,
}

impl PermissionEvaluator {
    pub fn new(mode: RbacMode, store: Arc<dyn PermissionStore>) -> Self {
        Self {
            mode,
            store,
            faults: AtomicU64::new(0),
        }
    }

    /// An evaluator over an in-memory store holding the default matrix.
    pub fn with_defaults(mode: RbacMode) -> Self {
        Self::new(mode, Arc::new(MemoryPermissionStore::with_defaults()))
    }

    pub fn mode(&self) -> RbacMode {
        self.mode
    }

    pub fn store(&self) -> &Arc<dyn PermissionStore> {
        &self.store
    }

    /// Number of checks that failed closed because the store errored.
    pub fn fault_count(&self) -> u64 {
        self.faults.load(Ordering::Relaxed)
    }

    pub async fn has_permission(&self, role: Role, resource: &Resource, action: Action) -> bool {
        if role.is_admin() {
            return true;
        }

        match self.mode {
            RbacMode::Legacy => legacy_policy(role, resource, action),
            RbacMode::Enforced => {
                let permission = Permission::new(resource.clone(), action);
                match self.store.lookup(role, &permission).await {
                    Ok(granted) => granted.unwrap_or(false),
                    Err(e) => {
                        self.faults.fetch_add(1, Ordering::Relaxed);
                        error!(
                            event = "evaluator_fault",
                            store = self.store.name(),
                            %role,
                            %permission,
                            error = %e,
                            "Permission store failed, denying"
                        );
                        false
                    }
                }
            }
        }
    }

    /// Check by role name. Unknown names are denied.
    pub async fn has_permission_named(&self, role: &str, resource: &Resource, action: Action) -> bool {
        match Role::parse(role) {
            Ok(role) => self.has_permission(role, resource, action).await,
            Err(_) => false,
        }
    }

    /// True iff at least one check passes. Stops at the first success.
    pub async fn has_any_permission(&self, role: Role, permissions: &[Permission]) -> bool {
        for permission in permissions {
            if self
                .has_permission(role, &permission.resource, permission.action)
                .await
            {
                return true;
            }
        }
        false
    }

    /// True iff every check passes. Stops at the first failure.
    pub async fn has_all_permissions(&self, role: Role, permissions: &[Permission]) -> bool {
        self.first_denied(role, permissions).await.is_none()
    }

    /// The first permission in `permissions` the role does not hold.
    pub async fn first_denied<'a>(
        &self,
        role: Role,
        permissions: &'a [Permission],
    ) -> Option<&'a Permission> {
        for permission in permissions {
            if !self
                .has_permission(role, &permission.resource, permission.action)
                .await
            {
                return Some(permission);
            }
        }
        None
    }

    /// Roles for which [`has_permission`](Self::has_permission) is true.
    pub async fn roles_with_permission(&self, resource: &Resource, action: Action) -> Vec<Role> {
        let mut roles = Vec::new();
        for role in Role::all() {
            if self.has_permission(role, resource, action).await {
                roles.push(role);
            }
        }
        roles
    }

    /// Everything a role may do, over the known resources plus any resource
    /// that has a row in the store.
    pub async fn permissions_for(&self, role: Role) -> Vec<Permission> {
        let mut candidates: BTreeSet<Permission> = Resource::known()
            .flat_map(|resource| {
                resource
                    .supported_actions()
                    .iter()
                    .map(move |&action| Permission::new(resource.clone(), action))
            })
            .collect();

        if self.mode == RbacMode::Enforced {
            match self.store.snapshot().await {
                Ok(snapshot) => {
                    candidates.extend(snapshot.iter().map(|(_, permission, _)| permission.clone()))
                }
                Err(e) => {
                    self.faults.fetch_add(1, Ordering::Relaxed);
                    error!(event = "evaluator_fault", store = self.store.name(), error = %e, "Permission snapshot failed");
                }
            }
        }

        let mut granted = Vec::new();
        for permission in candidates {
            if self
                .has_permission(role, &permission.resource, permission.action)
                .await
            {
                granted.push(permission);
            }
        }
        granted
    }

    /// The stored matrix.
    pub async fn snapshot(&self) -> Result<PermissionMatrix, RbacError> {
        Ok(self.store.snapshot().await?)
    }

    /// Allow `role` to perform `permission`.
    #[instrument(skip(self, permission), fields(permission = %permission))]
    pub async fn grant(&self, role: Role, permission: &Permission) -> Result<(), RbacError> {
        self.set(role, permission, true).await
    }

    /// Deny `role` `permission`.
    #[instrument(skip(self, permission), fields(permission = %permission))]
    pub async fn revoke(&self, role: Role, permission: &Permission) -> Result<(), RbacError> {
        self.set(role, permission, false).await
    }

    /// Write one grant row.
    pub async fn set(&self, role: Role, permission: &Permission, granted: bool) -> Result<(), RbacError> {
        permission.ensure_supported()?;
        self.store.set_grant(role, permission, granted).await?;
        info!(%role, %permission, granted, "Grant updated");
        Ok(())
    }

    /// Insert any default rows missing from the store.
    pub async fn seed_defaults(&self) -> Result<usize, RbacError> {
        Ok(self.store.seed(&PermissionMatrix::defaults()).await?)
    }

    /// Discard runtime edits and restore the default matrix.
    pub async fn reset_to_defaults(&self) -> Result<(), RbacError> {
        self.store.replace_all(&PermissionMatrix::defaults()).await?;
        info!("Grant matrix reset to defaults");
        Ok(())
    }
}

impl fmt::Debug for PermissionEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionEvaluator")
            .field("mode", &self.mode)
            .field("store", &self.store.name())
            .field("faults", &self.fault_count())
            .finish()
    }
}

/// Policy used while RBAC enforcement is off.
///
/// Listers may do anything except write users or settings; viewers may read;
/// roles the legacy policy does not know are denied.
fn legacy_policy(role: Role, resource: &Resource, action: Action) -> bool {
    match role {
        Role::Admin => true,
        Role::Lister => {
            let restricted = *resource == Resource::USERS || *resource == Resource::SETTINGS;
            !(restricted && action != Action::Read)
        }
        Role::Viewer => action == Action::Read,
        Role::Analyst => false,
    }
}
