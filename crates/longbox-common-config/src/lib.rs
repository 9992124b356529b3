//! Configuration types for Longbox.
//!
//! Configuration comes from an optional `longbox.yaml`, `.env` files and
//! `LONGBOX_*` environment variables, in increasing order of precedence.

pub mod env;
pub mod loader;
pub mod types;

pub use env::{parse_flag, vars, Environment};
pub use loader::{validate, ConfigError, ConfigLoader};
pub use types::*;
