//! User storage.

use super::error::AccountError;
use super::types::UserRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use longbox_common_core::UserId;
use longbox_rbac::Role;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::instrument;

/// Where user accounts live.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Case-insensitive lookup.
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, AccountError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, AccountError>;

    /// Every user, ordered by username.
    async fn list(&self) -> Result<Vec<UserRecord>, AccountError>;

    /// Fails with [`AccountError::UsernameTaken`] on a duplicate name.
    async fn insert(&self, user: &UserRecord) -> Result<(), AccountError>;

    /// Returns false when no such user exists.
    async fn update_role(&self, id: UserId, role: Role) -> Result<bool, AccountError>;

    /// Returns false when no such user exists.
    async fn delete(&self, id: UserId) -> Result<bool, AccountError>;

    async fn count(&self) -> Result<u64, AccountError>;
}

/// Users in the `users` table.
#[derive(Debug, Clone)]
pub struct SqliteUserDirectory {
    pool: SqlitePool,
}

impl SqliteUserDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const COLUMNS: &str = "id, username, password_hash, full_name, role, created_at, updated_at";

fn user_from_row(row: &SqliteRow) -> Result<UserRecord, AccountError> {
    let id: String = row.try_get("id")?;
    let role: String = row.try_get("role")?;
    let full_name: String = row.try_get("full_name")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    Ok(UserRecord {
        id: UserId::parse(&id).map_err(|_| AccountError::Malformed(format!("id = {id:?}")))?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        full_name: Some(full_name).filter(|name| !name.is_empty()),
        // Rows written before the lister rename hold `user`.
        role: Role::parse(&role).map_err(|_| AccountError::Malformed(format!("role = {role:?}")))?,
        created_at,
        updated_at,
    })
}

#[async_trait]
impl UserDirectory for SqliteUserDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, AccountError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM users WHERE username = ?"))
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, AccountError> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM users WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<UserRecord>, AccountError> {
        let rows = sqlx::query(&format!("SELECT {COLUMNS} FROM users ORDER BY username"))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(user_from_row).collect()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id, username = %user.username))]
    async fn insert(&self, user: &UserRecord) -> Result<(), AccountError> {
        let result = sqlx::query(&format!(
            "INSERT INTO users ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.full_name.clone().unwrap_or_default())
        .bind(user.role.as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(AccountError::UsernameTaken(user.username.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_role(&self, id: UserId, role: Role) -> Result<bool, AccountError> {
        let result = sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: UserId) -> Result<bool, AccountError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<u64, AccountError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}
