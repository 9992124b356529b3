//! Longbox common core types.

pub mod id;

pub use id::{AuditEntryId, ComicId, IdParseError, UserId};
