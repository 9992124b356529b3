use super::types::*;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;
use tracing::{debug, info};

pub struct MigrationRunner {
    pool: SqlitePool,
    migrations: BTreeMap<i64, Migration>,
}

impl MigrationRunner {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            migrations: BTreeMap::new(),
        }
    }

    pub fn add_migration(&mut self, migration: Migration) {
        self.migrations.insert(migration.version, migration);
    }

    pub fn add_migrations(&mut self, migrations: impl IntoIterator<Item = Migration>) {
        for migration in migrations {
            self.add_migration(migration);
        }
    }

    /// Initialize the migration tracking table
    pub async fn init(&self) -> Result<(), MigrationError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _longbox_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                checksum TEXT NOT NULL,
                applied_at DATETIME NOT NULL,
                execution_time_ms INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Highest applied migration version
    pub async fn current_version(&self) -> Result<Option<i64>, MigrationError> {
        self.init().await?;

        let row = sqlx::query("SELECT MAX(version) AS version FROM _longbox_migrations")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.try_get::<Option<i64>, _>("version")?)
    }

    pub async fn get_applied(&self) -> Result<Vec<AppliedMigration>, MigrationError> {
        self.init().await?;

        let applied = sqlx::query_as::<_, AppliedMigration>(
            "SELECT version, name, checksum, applied_at, execution_time_ms
             FROM _longbox_migrations
             ORDER BY version",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(applied)
    }

    pub async fn pending(&self) -> Result<Vec<Migration>, MigrationError> {
        let current = self.current_version().await?.unwrap_or(0);

        Ok(self
            .migrations
            .range((current + 1)..)
            .map(|(_, m)| m.clone())
            .collect())
    }

    /// Compare applied checksums against the registered migrations.
    pub async fn verify(&self) -> Result<Vec<String>, MigrationError> {
        let applied = self.get_applied().await?;
        let mut mismatches = Vec::new();

        for applied_migration in applied {
            match self.migrations.get(&applied_migration.version) {
                Some(known) if known.checksum != applied_migration.checksum => {
                    mismatches.push(format!(
                        "migration {} expected {}, found {}",
                        applied_migration.version, known.checksum, applied_migration.checksum
                    ));
                }
                Some(_) => {}
                None => mismatches.push(format!(
                    "migration {} is applied but unknown",
                    applied_migration.version
                )),
            }
        }

        Ok(mismatches)
    }

    /// Verify, then apply every pending migration in version order.
    pub async fn run(&self) -> Result<Vec<MigrationResult>, MigrationError> {
        let mismatches = self.verify().await?;
        if !mismatches.is_empty() {
            return Err(MigrationError::ChecksumMismatch(mismatches.join("; ")));
        }

        let pending = self.pending().await?;
        if pending.is_empty() {
            debug!("Schema up to date");
            return Ok(Vec::new());
        }

        let mut results = Vec::with_capacity(pending.len());

        for migration in pending {
            let start = std::time::Instant::now();
            info!(version = migration.version, name = %migration.name, "Applying migration");

            let mut tx = self.pool.begin().await?;

            sqlx::query(&migration.up_sql)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    MigrationError::ExecutionFailed(format!(
                        "failed to apply migration {}: {}",
                        migration.version, e
                    ))
                })?;

            let elapsed = start.elapsed().as_millis() as i64;
            sqlx::query(
                "INSERT INTO _longbox_migrations
                 (version, name, checksum, applied_at, execution_time_ms)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(migration.version)
            .bind(&migration.name)
            .bind(&migration.checksum)
            .bind(Utc::now())
            .bind(elapsed)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;

            results.push(MigrationResult {
                version: migration.version,
                name: migration.name,
                execution_time_ms: elapsed,
            });
        }

        Ok(results)
    }
}
