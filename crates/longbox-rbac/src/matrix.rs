//! The grant matrix.

use crate::permission::{Action, Permission, Resource};
use crate::role::Role;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of the grant matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub role: Role,
    pub resource: Resource,
    pub action: Action,
    pub granted: bool,
}

impl Grant {
    pub fn permission(&self) -> Permission {
        Permission::new(self.resource.clone(), self.action)
    }
}

/// `(role, resource, action) -> granted` table. Absent entries are denied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionMatrix {
    grants: BTreeMap<(Role, Permission), bool>,
}

impl PermissionMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in matrix. Seeds the dynamic store.
    ///
    /// Every supported combination of role and known resource has an explicit
    /// entry.
    pub fn defaults() -> Self {
        let mut matrix = Self::new();

        for role in Role::all() {
            for resource in Resource::known() {
                for &action in resource.supported_actions() {
                    matrix.set(role, Permission::new(resource.clone(), action), false);
                }
            }
        }

        for resource in Resource::known() {
            matrix = matrix
                .with_full_access(Role::Admin, resource.clone())
                .with_grant(Role::Analyst, resource.clone(), Action::Read)
                .with_grant(Role::Viewer, resource, Action::Read);
        }

        matrix
            .with_grant(Role::Analyst, Resource::REPORTS, Action::Create)
            .with_full_access(Role::Lister, Resource::COMICS)
            .with_full_access(Role::Lister, Resource::IMPORT)
            .with_full_access(Role::Lister, Resource::EXPORT)
            .with_full_access(Role::Lister, Resource::REPORTS)
            .with_grant(Role::Lister, Resource::SHOPIFY, Action::Read)
            .with_grant(Role::Lister, Resource::PUBLISH_JOBS, Action::Create)
            .with_grant(Role::Lister, Resource::PUBLISH_JOBS, Action::Read)
            .with_grant(Role::Lister, Resource::USERS, Action::Read)
            .with_grant(Role::Lister, Resource::SETTINGS, Action::Read)
    }

    /// Grant every action the resource supports.
    pub fn with_full_access(mut self, role: Role, resource: Resource) -> Self {
        for &action in resource.supported_actions() {
            self.set(role, Permission::new(resource.clone(), action), true);
        }
        self
    }

    pub fn with_grant(mut self, role: Role, resource: Resource, action: Action) -> Self {
        self.set(role, Permission::new(resource, action), true);
        self
    }

    pub fn set(&mut self, role: Role, permission: Permission, granted: bool) {
        self.grants.insert((role, permission), granted);
    }

    pub fn remove(&mut self, role: Role, permission: &Permission) -> Option<bool> {
        self.grants.remove(&(role, permission.clone()))
    }

    /// The stored entry, if any.
    pub fn get(&self, role: Role, permission: &Permission) -> Option<bool> {
        self.grants.get(&(role, permission.clone())).copied()
    }

    pub fn is_granted(&self, role: Role, resource: &Resource, action: Action) -> bool {
        self.get(role, &Permission::new(resource.clone(), action))
            .unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, &Permission, bool)> + '_ {
        self.grants
            .iter()
            .map(|((role, permission), granted)| (*role, permission, *granted))
    }

    /// Permissions granted to a role.
    pub fn for_role(&self, role: Role) -> Vec<Permission> {
        self.iter()
            .filter(|(r, _, granted)| *r == role && *granted)
            .map(|(_, permission, _)| permission.clone())
            .collect()
    }

    pub fn grants(&self) -> Vec<Grant> {
        self.iter()
            .map(|(role, permission, granted)| Grant {
                role,
                resource: permission.resource.clone(),
                action: permission.action,
                granted,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

impl FromIterator<Grant> for PermissionMatrix {
    fn from_iter<I: IntoIterator<Item = Grant>>(iter: I) -> Self {
        let mut matrix = Self::new();
        for grant in iter {
            matrix.set(grant.role, grant.permission(), grant.granted);
        }
        matrix
    }
}
