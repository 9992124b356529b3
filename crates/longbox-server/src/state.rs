//! Shared application state.

use crate::accounts::{AccountService, SqliteUserDirectory};
use crate::middleware::authz::Authorizer;
use crate::middleware::session::{CookieSessionResolver, SessionIssuer};
use anyhow::Context;
use longbox_audit_capture::{AuditLogger, AuditLoggerConfig, SqliteAuditSink};
use longbox_common_config::LongboxConfig;
use longbox_database::{DatabasePool, PoolConfig};
use longbox_rbac::{PermissionEvaluator, RbacMode, SqlitePermissionStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Everything handlers need, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<LongboxConfig>,
    pub db: DatabasePool,
    pub evaluator: Arc<PermissionEvaluator>,
    pub audit: AuditLogger,
    pub sessions: Arc<SessionIssuer>,
    pub authorizer: Authorizer,
    pub accounts: AccountService,
}

impl AppState {
    /// Open the database, seed missing default grants and wire the services.
    pub async fn new(config: LongboxConfig) -> anyhow::Result<Self> {
        let pool_config = pool_config(&config)?;
        let db = longbox_database::open(pool_config)
            .await
            .context("failed to open database")?;

        let mode = RbacMode::from_flag(config.features.rbac_enabled);
        let evaluator = Arc::new(PermissionEvaluator::new(
            mode,
            Arc::new(SqlitePermissionStore::new(db.pool().clone())),
        ));
        let seeded = evaluator
            .seed_defaults()
            .await
            .context("failed to seed default permissions")?;
        info!(%mode, seeded, "Permission evaluator ready");

        let audit = AuditLogger::with_config(
            Arc::new(SqliteAuditSink::new(db.pool().clone())),
            AuditLoggerConfig {
                default_page_size: config.audit.default_page_size,
                max_page_size: config.audit.max_page_size,
                write_timeout: Duration::from_millis(config.audit.denial_write_timeout_ms),
            },
        );

        let sessions = Arc::new(SessionIssuer::new(&config.session));
        let authorizer = Authorizer::new(
            Arc::new(CookieSessionResolver::new(sessions.clone())),
            evaluator.clone(),
            audit.clone(),
        );
        let accounts = AccountService::new(
            Arc::new(SqliteUserDirectory::new(db.pool().clone())),
            audit.clone(),
            sessions.clone(),
        );

        if let Some(password) = &config.bootstrap.admin_password {
            accounts
                .bootstrap_admin(&config.bootstrap.admin_username, password)
                .await
                .context("failed to create bootstrap administrator")?;
        }

        Ok(Self {
            config: Arc::new(config),
            db,
            evaluator,
            audit,
            sessions,
            authorizer,
            accounts,
        })
    }
}

fn pool_config(config: &LongboxConfig) -> anyhow::Result<PoolConfig> {
    if config.database.path == ":memory:" {
        return Ok(PoolConfig::in_memory());
    }
    PoolConfig::builder()
        .database_path(config.database.path.clone())
        .max_connections(config.database.max_connections)
        .build()
        .context("invalid database configuration")
}
