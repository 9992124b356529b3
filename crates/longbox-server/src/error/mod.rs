//! Error handling for the Longbox API server.

pub mod response;
pub mod types;

pub use types::{ApiError, ApiResult};
