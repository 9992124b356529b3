//! Audit storage backends.

mod memory;
mod sqlite;

pub use memory::MemoryAuditSink;
pub use sqlite::SqliteAuditSink;

use crate::error::AuditError;
use async_trait::async_trait;
use longbox_audit_types::{AuditEntry, AuditFilter, AuditPage};

/// Append-only audit storage. Entries are never updated or deleted.
#[async_trait]
pub trait AuditSink: Send + Sync {
    fn name(&self) -> &'static str;

    async fn append(&self, entry: &AuditEntry) -> Result<(), AuditError>;

    /// Matching entries, newest first. `limit` and `offset` are already
    /// validated; `count` is the total before pagination.
    async fn query(
        &self,
        filter: &AuditFilter,
        limit: u32,
        offset: u32,
    ) -> Result<AuditPage, AuditError>;
}
