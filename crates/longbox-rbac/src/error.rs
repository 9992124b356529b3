//! RBAC error types.

use thiserror::Error;

/// Errors from the role and permission model.
#[derive(Debug, Error)]
pub enum RbacError {
    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("invalid resource name: {0:?}")]
    InvalidResource(String),

    #[error("invalid permission: {0:?} (expected \"resource.action\")")]
    InvalidPermission(String),

    #[error("{resource} does not support {action}")]
    UnsupportedAction { resource: String, action: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from a [`PermissionStore`](crate::PermissionStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("permission store unavailable: {0}")]
    Backend(String),

    #[error("malformed grant row: {0}")]
    Malformed(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}
