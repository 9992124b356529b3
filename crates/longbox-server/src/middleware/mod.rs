//! Middleware for the Longbox API server.

pub mod authz;
pub mod session;
