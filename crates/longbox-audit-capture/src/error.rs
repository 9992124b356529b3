use thiserror::Error;

/// Audit persistence and query errors.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit store error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("audit store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed audit row: {0}")]
    Malformed(String),
}
