//! Role-based access control for Longbox.
//!
//! This crate provides:
//! - The closed set of [`Role`]s and their display metadata
//! - Open-ended [`Resource`]s, CRUD [`Action`]s and [`Permission`] pairs
//! - The default grant [`PermissionMatrix`]
//! - [`PermissionStore`] backends (in-memory and SQLite) for the dynamic matrix
//! - The [`PermissionEvaluator`], which answers "may role R do A on X?"
//!
//! # Example
//!
//! ```
//! use longbox_rbac::{Action, PermissionEvaluator, RbacMode, Resource, Role};
//!
//! # tokio_test::block_on(async {
//! let evaluator = PermissionEvaluator::with_defaults(RbacMode::Legacy);
//! assert!(evaluator.has_permission(Role::Lister, &Resource::COMICS, Action::Create).await);
//! assert!(!evaluator.has_permission(Role::Lister, &Resource::USERS, Action::Create).await);
//! # });
//! ```

pub mod error;
pub mod evaluator;
pub mod matrix;
pub mod permission;
pub mod role;
pub mod store;

pub use error::{RbacError, StoreError};
pub use evaluator::{PermissionEvaluator, RbacMode};
pub use matrix::{Grant, PermissionMatrix};
pub use permission::{Action, Permission, Resource};
pub use role::{describe_role, Role, RoleDescription};
pub use store::{MemoryPermissionStore, PermissionStore, SqlitePermissionStore};
