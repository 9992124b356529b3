//! The Longbox schema.
//!
//! Each migration is a single statement. Never edit an existing entry; append a new one.

use crate::migration::{Migration, MigrationError, MigrationResult, MigrationRunner};
use sqlx::SqlitePool;

/// Every schema migration, in version order.
pub fn migrations() -> Vec<Migration> {
    vec![
        Migration::new(
            1,
            "create_role_permissions",
            r#"CREATE TABLE role_permissions (
                role TEXT NOT NULL,
                resource TEXT NOT NULL,
                action TEXT NOT NULL,
                granted INTEGER NOT NULL CHECK (granted IN (0, 1)),
                updated_at DATETIME NOT NULL,
                PRIMARY KEY (role, resource, action)
            )"#,
        ),
        Migration::new(
            2,
            "create_audit_logs",
            r#"CREATE TABLE audit_logs (
                id TEXT PRIMARY KEY,
                timestamp DATETIME NOT NULL,
                actor_user_id TEXT,
                actor_username TEXT,
                target_user_id TEXT,
                action TEXT NOT NULL,
                resource TEXT NOT NULL,
                resource_id TEXT,
                outcome TEXT NOT NULL,
                reason TEXT,
                ip_address TEXT,
                user_agent TEXT,
                metadata TEXT NOT NULL DEFAULT '{}'
            )"#,
        ),
        Migration::new(
            3,
            "index_audit_logs_timestamp",
            "CREATE INDEX idx_audit_logs_timestamp ON audit_logs (timestamp)",
        ),
        Migration::new(
            4,
            "index_audit_logs_actor",
            "CREATE INDEX idx_audit_logs_actor ON audit_logs (actor_user_id)",
        ),
        Migration::new(
            5,
            "index_audit_logs_action",
            "CREATE INDEX idx_audit_logs_action ON audit_logs (action)",
        ),
        Migration::new(
            6,
            "create_users",
            r#"CREATE TABLE users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password_hash TEXT NOT NULL,
                full_name TEXT NOT NULL DEFAULT '',
                role TEXT NOT NULL,
                created_at DATETIME NOT NULL,
                updated_at DATETIME NOT NULL
            )"#,
        ),
    ]
}

/// Apply all pending schema migrations.
pub async fn migrate(pool: &SqlitePool) -> Result<Vec<MigrationResult>, MigrationError> {
    let mut runner = MigrationRunner::new(pool.clone());
    runner.add_migrations(migrations());
    runner.run().await
}
