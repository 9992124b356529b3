//! Append-only audit logging for Longbox.
//!
//! [`AuditLogger::record`] hands the entry to a background task and returns
//! immediately. Persistence failures are logged locally and never reach the
//! caller. Callers that must know the entry was attempted before they proceed
//! can await the returned [`AuditHandle`]; dropping the handle instead leaves
//! the write running on its own.

mod error;
mod helpers;
mod logger;
mod sink;

pub use error::AuditError;
pub use helpers::{AuthEvent, ComicEvent, TransferEvent, TransferSummary};
pub use logger::{AuditHandle, AuditLogger, AuditLoggerConfig};
pub use sink::{AuditSink, MemoryAuditSink, SqliteAuditSink};

pub use longbox_audit_types::{
    AuditAction, AuditActor, AuditContext, AuditEntry, AuditEntryBuilder, AuditFilter,
    AuditOutcome, AuditPage,
};
