use super::PermissionStore;
use crate::error::StoreError;
use crate::matrix::PermissionMatrix;
use crate::permission::{Action, Permission, Resource};
use crate::role::Role;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::{debug, instrument};

/// Grant store backed by the `role_permissions` table.
#[derive(Debug, Clone)]
pub struct SqlitePermissionStore {
    pool: SqlitePool,
}

impl SqlitePermissionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const UPSERT: &str = "INSERT INTO role_permissions (role, resource, action, granted, updated_at)
     VALUES (?, ?, ?, ?, ?)
     ON CONFLICT (role, resource, action)
     DO UPDATE SET granted = excluded.granted, updated_at = excluded.updated_at";

/// The legacy name older databases stored for `role`, if it ever had one.
/// Rows under the current name win over legacy rows.
fn stored_names(role: Role) -> (&'static str, &'static str) {
    match role {
        Role::Lister => (role.as_str(), Role::LEGACY_LISTER_ALIAS),
        _ => (role.as_str(), role.as_str()),
    }
}

const INSERT_MISSING: &str =
    "INSERT OR IGNORE INTO role_permissions (role, resource, action, granted, updated_at)
     VALUES (?, ?, ?, ?, ?)";

#[async_trait]
impl PermissionStore for SqlitePermissionStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn lookup(
        &self,
        role: Role,
        permission: &Permission,
    ) -> Result<Option<bool>, StoreError> {
        let (current, legacy) = stored_names(role);
        let granted: Option<bool> = sqlx::query_scalar(
            "SELECT granted FROM role_permissions
             WHERE role IN (?, ?) AND resource = ? AND action = ?
             ORDER BY CASE role WHEN ? THEN 0 ELSE 1 END
             LIMIT 1",
        )
        .bind(current)
        .bind(legacy)
        .bind(permission.resource.as_str())
        .bind(permission.action.as_ref())
        .bind(current)
        .fetch_optional(&self.pool)
        .await?;

        Ok(granted)
    }

    #[instrument(skip(self, permission), fields(permission = %permission))]
    async fn set_grant(
        &self,
        role: Role,
        permission: &Permission,
        granted: bool,
    ) -> Result<(), StoreError> {
        sqlx::query(UPSERT)
            .bind(role.as_str())
            .bind(permission.resource.as_str())
            .bind(permission.action.as_ref())
            .bind(granted)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        debug!(%role, granted, "Grant row written");
        Ok(())
    }

    async fn remove_grant(&self, role: Role, permission: &Permission) -> Result<bool, StoreError> {
        let (current, legacy) = stored_names(role);
        let result = sqlx::query(
            "DELETE FROM role_permissions WHERE role IN (?, ?) AND resource = ? AND action = ?",
        )
        .bind(current)
        .bind(legacy)
        .bind(permission.resource.as_str())
        .bind(permission.action.as_ref())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn snapshot(&self) -> Result<PermissionMatrix, StoreError> {
        // Legacy rows first so current-name rows overwrite them.
        let rows = sqlx::query(
            "SELECT role, resource, action, granted FROM role_permissions
             ORDER BY CASE role WHEN ? THEN 0 ELSE 1 END",
        )
        .bind(Role::LEGACY_LISTER_ALIAS)
        .fetch_all(&self.pool)
        .await?;

        let mut matrix = PermissionMatrix::new();
        for row in rows {
            let role: String = row.try_get("role")?;
            let resource: String = row.try_get("resource")?;
            let action: String = row.try_get("action")?;
            let granted: bool = row.try_get("granted")?;

            let role = Role::parse(&role).map_err(|e| StoreError::Malformed(e.to_string()))?;
            let resource =
                Resource::parse(&resource).map_err(|e| StoreError::Malformed(e.to_string()))?;
            let action = Action::parse(&action).map_err(|e| StoreError::Malformed(e.to_string()))?;

            matrix.set(role, Permission::new(resource, action), granted);
        }

        Ok(matrix)
    }

    #[instrument(skip_all, fields(rows = matrix.len()))]
    async fn seed(&self, matrix: &PermissionMatrix) -> Result<usize, StoreError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();
        let mut inserted = 0;

        for (role, permission, granted) in matrix.iter() {
            let result = sqlx::query(INSERT_MISSING)
                .bind(role.as_str())
                .bind(permission.resource.as_str())
                .bind(permission.action.as_ref())
                .bind(granted)
                .bind(now)
                .execute(&mut *tx)
                .await?;
            inserted += result.rows_affected() as usize;
        }

        tx.commit().await?;
        debug!(inserted, "Seeded grant matrix");
        Ok(inserted)
    }

    #[instrument(skip_all, fields(rows = matrix.len()))]
    async fn replace_all(&self, matrix: &PermissionMatrix) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        sqlx::query("DELETE FROM role_permissions")
            .execute(&mut *tx)
            .await?;

        for (role, permission, granted) in matrix.iter() {
            sqlx::query(UPSERT)
                .bind(role.as_str())
                .bind(permission.resource.as_str())
                .bind(permission.action.as_ref())
                .bind(granted)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::{PermissionEvaluator, RbacMode};
    use longbox_database::{open, PoolConfig};
    use std::sync::Arc;

    async fn store() -> SqlitePermissionStore {
        let db = open(PoolConfig::in_memory()).await.unwrap();
        SqlitePermissionStore::new(db.pool().clone())
    }

    #[tokio::test]
    async fn test_upsert_overwrites_single_row() {
        let store = store().await;
        let perm = Permission::new(Resource::COMICS, Action::Create);

        assert_eq!(store.lookup(Role::Viewer, &perm).await.unwrap(), None);

        store.set_grant(Role::Viewer, &perm, true).await.unwrap();
        assert_eq!(store.lookup(Role::Viewer, &perm).await.unwrap(), Some(true));

        store.set_grant(Role::Viewer, &perm, false).await.unwrap();
        assert_eq!(store.lookup(Role::Viewer, &perm).await.unwrap(), Some(false));
        assert_eq!(store.snapshot().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_seed_is_idempotent_and_preserves_edits() {
        let store = store().await;
        let defaults = PermissionMatrix::defaults();

        assert_eq!(store.seed(&defaults).await.unwrap(), defaults.len());

        let perm = Permission::new(Resource::COMICS, Action::Delete);
        store.set_grant(Role::Lister, &perm, false).await.unwrap();

        assert_eq!(store.seed(&defaults).await.unwrap(), 0);
        assert_eq!(store.lookup(Role::Lister, &perm).await.unwrap(), Some(false));
    }

    #[tokio::test]
    async fn test_snapshot_matches_seed() {
        let store = store().await;
        store.seed(&PermissionMatrix::defaults()).await.unwrap();
        assert_eq!(store.snapshot().await.unwrap(), PermissionMatrix::defaults());
    }

    #[tokio::test]
    async fn test_legacy_role_rows_read_as_lister() {
        let store = store().await;
        sqlx::query(
            "INSERT INTO role_permissions (role, resource, action, granted, updated_at)
             VALUES ('user', 'comics', 'read', 1, ?)",
        )
        .bind(Utc::now())
        .execute(&store.pool)
        .await
        .unwrap();

        let snapshot = store.snapshot().await.unwrap();
        assert!(snapshot.is_granted(Role::Lister, &Resource::COMICS, Action::Read));
        let perm = Permission::new(Resource::COMICS, Action::Read);
        assert_eq!(store.lookup(Role::Lister, &perm).await.unwrap(), Some(true));
    }

    async fn insert_raw(store: &SqlitePermissionStore, role: &str, granted: bool) {
        sqlx::query(
            "INSERT INTO role_permissions (role, resource, action, granted, updated_at)
             VALUES (?, 'vault', 'read', ?, ?)",
        )
        .bind(role)
        .bind(granted)
        .bind(Utc::now())
        .execute(&store.pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_lookup_and_snapshot_agree_on_legacy_rows() {
        let store = store().await;
        insert_raw(&store, "user", true).await;
        let vault = Resource::new("vault");
        let perm = Permission::new(vault.clone(), Action::Read);

        let snapshot = store.snapshot().await.unwrap();
        assert!(snapshot.is_granted(Role::Lister, &vault, Action::Read));
        assert_eq!(store.lookup(Role::Lister, &perm).await.unwrap(), Some(true));
        assert_eq!(store.lookup(Role::Viewer, &perm).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_evaluator_honors_legacy_rows() {
        let store = store().await;
        insert_raw(&store, "user", true).await;
        let evaluator = PermissionEvaluator::new(RbacMode::Enforced, Arc::new(store));
        let vault = Resource::new("vault");

        assert!(evaluator.has_permission(Role::Lister, &vault, Action::Read).await);
        assert!(evaluator.has_permission_named("user", &vault, Action::Read).await);
        assert!(!evaluator.has_permission(Role::Viewer, &vault, Action::Read).await);
    }

    #[tokio::test]
    async fn test_current_role_row_beats_legacy_row() {
        let store = store().await;
        insert_raw(&store, "user", true).await;
        insert_raw(&store, "lister", false).await;
        let vault = Resource::new("vault");
        let perm = Permission::new(vault.clone(), Action::Read);

        assert_eq!(store.lookup(Role::Lister, &perm).await.unwrap(), Some(false));
        let snapshot = store.snapshot().await.unwrap();
        assert!(!snapshot.is_granted(Role::Lister, &vault, Action::Read));

        assert!(store.remove_grant(Role::Lister, &perm).await.unwrap());
        assert_eq!(store.lookup(Role::Lister, &perm).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_malformed_row() {
        let store = store().await;
        sqlx::query(
            "INSERT INTO role_permissions (role, resource, action, granted, updated_at)
             VALUES ('root', 'comics', 'read', 1, ?)",
        )
        .bind(Utc::now())
        .execute(&store.pool)
        .await
        .unwrap();

        assert!(matches!(
            store.snapshot().await,
            Err(StoreError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_replace_all_and_remove() {
        let store = store().await;
        store.seed(&PermissionMatrix::defaults()).await.unwrap();

        let perm = Permission::new(Resource::COMICS, Action::Read);
        assert!(store.remove_grant(Role::Viewer, &perm).await.unwrap());
        assert_eq!(store.lookup(Role::Viewer, &perm).await.unwrap(), None);

        store.replace_all(&PermissionMatrix::defaults()).await.unwrap();
        assert_eq!(store.lookup(Role::Viewer, &perm).await.unwrap(), Some(true));
    }
}
