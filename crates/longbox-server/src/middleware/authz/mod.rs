//! Authorization: the single gate in front of protected handlers.
//!
//! [`Authorizer::authorize`] resolves the caller, applies an [`AuthzConfig`]
//! and returns an [`AuthzVerdict`]. Denials of a known caller are audited
//! before the verdict is returned. [`AuthzLayer`] and [`protect`] run the same
//! check in front of a router or a single handler and never reach the handler
//! on a denial.

pub mod authorizer;
pub mod layer;
pub mod protect;
pub mod types;

pub use authorizer::Authorizer;
pub use layer::{AuthzLayer, AuthzMiddleware};
pub use protect::protect;
pub use types::{AuthzConfig, AuthzConfigError, AuthzVerdict};
