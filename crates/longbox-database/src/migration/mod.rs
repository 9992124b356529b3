//! Checksummed, forward-only schema migrations.

mod runner;
mod types;

pub use runner::MigrationRunner;
pub use types::*;
