use super::PermissionStore;
use crate::error::StoreError;
use crate::matrix::PermissionMatrix;
use crate::permission::Permission;
use crate::role::Role;
use async_trait::async_trait;
use dashmap::DashMap;

/// In-process grant store.
#[derive(Debug, Default)]
pub struct MemoryPermissionStore {
    grants: DashMap<(Role, Permission), bool>,
}

impl MemoryPermissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the given matrix.
    pub fn from_matrix(matrix: &PermissionMatrix) -> Self {
        let store = Self::new();
        for (role, permission, granted) in matrix.iter() {
            store.grants.insert((role, permission.clone()), granted);
        }
        store
    }

    /// A store holding [`PermissionMatrix::defaults`].
    pub fn with_defaults() -> Self {
        Self::from_matrix(&PermissionMatrix::defaults())
    }
}

#[async_trait]
impl PermissionStore for MemoryPermissionStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn lookup(
        &self,
        role: Role,
        permission: &Permission,
    ) -> Result<Option<bool>, StoreError> {
        Ok(self
            .grants
            .get(&(role, permission.clone()))
            .map(|entry| *entry.value()))
    }

    async fn set_grant(
        &self,
        role: Role,
        permission: &Permission,
        granted: bool,
    ) -> Result<(), StoreError> {
        self.grants.insert((role, permission.clone()), granted);
        Ok(())
    }

    async fn remove_grant(&self, role: Role, permission: &Permission) -> Result<bool, StoreError> {
        Ok(self.grants.remove(&(role, permission.clone())).is_some())
    }

    async fn snapshot(&self) -> Result<PermissionMatrix, StoreError> {
        let mut matrix = PermissionMatrix::new();
        for entry in self.grants.iter() {
            let (role, permission) = entry.key();
            matrix.set(*role, permission.clone(), *entry.value());
        }
        Ok(matrix)
    }

    async fn seed(&self, matrix: &PermissionMatrix) -> Result<usize, StoreError> {
        let mut inserted = 0;
        for (role, permission, granted) in matrix.iter() {
            if let dashmap::mapref::entry::Entry::Vacant(slot) =
                self.grants.entry((role, permission.clone()))
            {
                slot.insert(granted);
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn replace_all(&self, matrix: &PermissionMatrix) -> Result<(), StoreError> {
        self.grants.clear();
        for (role, permission, granted) in matrix.iter() {
            self.grants.insert((role, permission.clone()), granted);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::{Action, Resource};

    fn comics_create() -> Permission {
        Permission::new(Resource::COMICS, Action::Create)
    }

    #[tokio::test]
    async fn test_lookup_missing_row() {
        let store = MemoryPermissionStore::new();
        assert_eq!(store.lookup(Role::Viewer, &comics_create()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_and_remove() {
        let store = MemoryPermissionStore::new();
        store.set_grant(Role::Viewer, &comics_create(), true).await.unwrap();
        assert_eq!(
            store.lookup(Role::Viewer, &comics_create()).await.unwrap(),
            Some(true)
        );

        assert!(store.remove_grant(Role::Viewer, &comics_create()).await.unwrap());
        assert!(!store.remove_grant(Role::Viewer, &comics_create()).await.unwrap());
    }

    #[tokio::test]
    async fn test_seed_keeps_runtime_changes() {
        let store = MemoryPermissionStore::new();
        store.set_grant(Role::Viewer, &comics_create(), true).await.unwrap();

        let defaults = PermissionMatrix::defaults();
        let inserted = store.seed(&defaults).await.unwrap();
        assert_eq!(inserted, defaults.len() - 1);
        assert_eq!(
            store.lookup(Role::Viewer, &comics_create()).await.unwrap(),
            Some(true)
        );

        assert_eq!(store.seed(&defaults).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_replace_all() {
        let store = MemoryPermissionStore::with_defaults();
        store.set_grant(Role::Viewer, &comics_create(), true).await.unwrap();
        store
            .set_grant(Role::Viewer, &Permission::new(Resource::new("vault"), Action::Read), true)
            .await
            .unwrap();

        store.replace_all(&PermissionMatrix::defaults()).await.unwrap();
        assert_eq!(store.snapshot().await.unwrap(), PermissionMatrix::defaults());
    }
}
