//! Account errors.

use crate::error::ApiError;
use crate::middleware::session::SessionError;
use longbox_common_core::UserId;
use thiserror::Error;

/// Errors from account administration.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("username already taken: {0}")]
    UsernameTaken(String),

    #[error("user not found: {0}")]
    NotFound(UserId),

    #[error("administrators cannot change their own role")]
    SelfRoleChange,

    #[error("administrators cannot delete their own account")]
    SelfDeletion,

    #[error("{0}")]
    Invalid(String),

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("malformed user row: {0}")]
    Malformed(String),

    #[error(transparent)]
    Storage(#[from] sqlx::Error),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::InvalidCredentials => ApiError::InvalidCredentials,
            AccountError::UsernameTaken(_) => ApiError::Conflict(err.to_string()),
            AccountError::NotFound(_) => ApiError::NotFound("User".into()),
            AccountError::SelfRoleChange | AccountError::SelfDeletion | AccountError::Invalid(_) => {
                ApiError::BadRequest(err.to_string())
            }
            AccountError::Hash(_)
            | AccountError::Malformed(_)
            | AccountError::Storage(_)
            | AccountError::Session(_) => ApiError::Internal(err.into()),
        }
    }
}
