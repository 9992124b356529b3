use super::AuditSink;
use crate::error::AuditError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use longbox_audit_types::{AuditAction, AuditEntry, AuditEntryId, AuditFilter, AuditOutcome, AuditPage};
use longbox_common_core::UserId;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::str::FromStr;

/// Audit store backed by the `audit_logs` table.
#[derive(Debug, Clone)]
pub struct SqliteAuditSink {
    pool: SqlitePool,
}

impl SqliteAuditSink {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const COLUMNS: &str = "id, timestamp, actor_user_id, actor_username, target_user_id, action, \
    resource, resource_id, outcome, reason, ip_address, user_agent, metadata";

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &AuditFilter) {
    builder.push(" WHERE 1 = 1");
    if let Some(actor) = filter.actor_user_id {
        builder.push(" AND actor_user_id = ").push_bind(actor.to_string());
    }
    if let Some(target) = filter.target_user_id {
        builder.push(" AND target_user_id = ").push_bind(target.to_string());
    }
    if let Some(action) = filter.action {
        builder.push(" AND action = ").push_bind(action.to_string());
    }
    if let Some(resource) = &filter.resource {
        builder.push(" AND resource = ").push_bind(resource.clone());
    }
    if let Some(outcome) = filter.outcome {
        builder.push(" AND outcome = ").push_bind(outcome.to_string());
    }
    if let Some(from) = filter.from {
        builder.push(" AND timestamp >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        builder.push(" AND timestamp < ").push_bind(to);
    }
}

fn malformed(column: &str, value: &str) -> AuditError {
    AuditError::Malformed(format!("{column} = {value:?}"))
}

fn parse_user(column: &str, value: Option<String>) -> Result<Option<UserId>, AuditError> {
    value
        .map(|v| UserId::parse(&v).map_err(|_| malformed(column, &v)))
        .transpose()
}

fn entry_from_row(row: &SqliteRow) -> Result<AuditEntry, AuditError> {
    let id: String = row.try_get("id")?;
    let action: String = row.try_get("action")?;
    let outcome: String = row.try_get("outcome")?;
    let metadata: String = row.try_get("metadata")?;
    let timestamp: DateTime<Utc> = row.try_get("timestamp")?;

    Ok(AuditEntry {
        id: AuditEntryId::parse(&id).map_err(|_| malformed("id", &id))?,
        timestamp,
        actor_user_id: parse_user("actor_user_id", row.try_get("actor_user_id")?)?,
        actor_username: row.try_get("actor_username")?,
        target_user_id: parse_user("target_user_id", row.try_get("target_user_id")?)?,
        action: AuditAction::from_str(&action).map_err(|_| malformed("action", &action))?,
        resource: row.try_get("resource")?,
        resource_id: row.try_get("resource_id")?,
        outcome: AuditOutcome::from_str(&outcome).map_err(|_| malformed("outcome", &outcome))?,
        reason: row.try_get("reason")?,
        ip_address: row.try_get("ip_address")?,
        user_agent: row.try_get("user_agent")?,
        metadata: serde_json::from_str(&metadata).map_err(|_| malformed("metadata", &metadata))?,
    })
}

#[async_trait]
impl AuditSink for SqliteAuditSink {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn append(&self, entry: &AuditEntry) -> Result<(), AuditError> {
        let metadata = serde_json::Value::Object(entry.metadata.clone()).to_string();

        sqlx::query(&format!(
            "INSERT INTO audit_logs ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(entry.id.to_string())
        .bind(entry.timestamp)
        .bind(entry.actor_user_id.map(|id| id.to_string()))
        .bind(&entry.actor_username)
        .bind(entry.target_user_id.map(|id| id.to_string()))
        .bind(entry.action.as_ref())
        .bind(&entry.resource)
        .bind(&entry.resource_id)
        .bind(entry.outcome.as_ref())
        .bind(&entry.reason)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(metadata)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn query(
        &self,
        filter: &AuditFilter,
        limit: u32,
        offset: u32,
    ) -> Result<AuditPage, AuditError> {
        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM audit_logs");
        push_filter(&mut count_query, filter);
        let count: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut data_query = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM audit_logs"));
        push_filter(&mut data_query, filter);
        data_query
            .push(" ORDER BY timestamp DESC, rowid DESC LIMIT ")
            .push_bind(i64::from(limit))
            .push(" OFFSET ")
            .push_bind(i64::from(offset));

        let rows = data_query.build().fetch_all(&self.pool).await?;
        let data = rows
            .iter()
            .map(entry_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AuditPage {
            data,
            count: count.max(0) as u64,
        })
    }
}
