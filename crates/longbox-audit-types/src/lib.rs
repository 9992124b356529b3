//! Audit log entry types for Longbox.

mod action;
mod entry;
mod filter;

pub use action::{AuditAction, AuditOutcome};
pub use entry::{AuditActor, AuditContext, AuditEntry, AuditEntryBuilder};
pub use filter::{AuditFilter, AuditPage, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use longbox_common_core::AuditEntryId;
