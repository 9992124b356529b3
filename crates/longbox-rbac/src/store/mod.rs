//! Backends for the dynamic grant matrix.

mod memory;
mod sqlite;

pub use memory::MemoryPermissionStore;
pub use sqlite::SqlitePermissionStore;

use crate::error::StoreError;
use crate::matrix::PermissionMatrix;
use crate::permission::Permission;
use crate::role::Role;
use async_trait::async_trait;

/// Persistent `(role, resource, action) -> granted` rows.
///
/// A single-row write is atomic: a concurrent reader sees either the old or the
/// new value. Multi-row operations ([`seed`](Self::seed),
/// [`replace_all`](Self::replace_all)) need not be.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &'static str;

    /// The stored value, or `None` when no row exists.
    async fn lookup(&self, role: Role, permission: &Permission)
        -> Result<Option<bool>, StoreError>;

    /// Insert or overwrite one row.
    async fn set_grant(
        &self,
        role: Role,
        permission: &Permission,
        granted: bool,
    ) -> Result<(), StoreError>;

    /// Delete one row. Returns whether it existed.
    async fn remove_grant(&self, role: Role, permission: &Permission) -> Result<bool, StoreError>;

    /// Every stored row.
    async fn snapshot(&self) -> Result<PermissionMatrix, StoreError>;

    /// Insert rows that are missing, leaving existing rows untouched.
    /// Returns the number inserted.
    async fn seed(&self, matrix: &PermissionMatrix) -> Result<usize, StoreError>;

    /// Replace every row with the given matrix.
    async fn replace_all(&self, matrix: &PermissionMatrix) -> Result<(), StoreError>;
}
