//! SQLite persistence for Longbox.
//!
//! Provides the connection pool and the embedded schema. Call [`open`] to get a
//! pool with every migration applied.

pub mod migration;
pub mod pool;
pub mod schema;

pub use migration::{Migration, MigrationError, MigrationResult, MigrationRunner};
pub use pool::{DatabasePool, PoolConfig, PoolError, SynchronousMode};

use thiserror::Error;

/// Errors opening the database.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Migration(#[from] MigrationError),
}

/// Open a pool and bring the schema up to date.
pub async fn open(config: PoolConfig) -> Result<DatabasePool, DatabaseError> {
    let pool = DatabasePool::new(config).await?;
    schema::migrate(pool.pool()).await?;
    Ok(pool)
}
