//! Configuration types.

use serde::{Deserialize, Serialize};

/// Complete Longbox configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LongboxConfig {
    /// HTTP binding.
    pub server: ServerBindConfig,
    /// SQLite database.
    pub database: DatabaseConfig,
    /// Session credential settings.
    pub session: SessionConfig,
    /// Feature flags.
    pub features: FeatureFlags,
    /// Audit query limits.
    pub audit: AuditConfig,
    /// First administrator account.
    pub bootstrap: BootstrapConfig,
}

/// Server binding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerBindConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Request timeout.
    pub request_timeout_secs: u64,
}

impl Default for ServerBindConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            request_timeout_secs: 30,
        }
    }
}

impl ServerBindConfig {
    /// `host:port` string suitable for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file (`:memory:` for an in-memory database).
    pub path: String,
    /// Maximum connections in pool.
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "longbox.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Session credential configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// HMAC secret used to sign session cookies.
    pub secret: String,
    /// Cookie name carrying the session credential.
    pub cookie_name: String,
    /// Session lifetime in seconds.
    pub ttl_secs: u64,
    /// Mark the cookie `Secure`.
    pub secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            cookie_name: "longbox_session".to_string(),
            ttl_secs: 604_800, // 7 days
            secure_cookie: false,
        }
    }
}

/// Feature flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// Server-side RBAC enforcement: dynamic grant matrix instead of the legacy policy.
    pub rbac_enabled: bool,
    /// Client-visible mirror of `rbac_enabled`. Advisory only, never used for enforcement.
    pub public_rbac_enabled: bool,
}

/// Audit log query configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Page size when a query does not specify one.
    pub default_page_size: u32,
    /// Upper bound on page size.
    pub max_page_size: u32,
    /// How long an access check waits for its denial entry to be written.
    pub denial_write_timeout_ms: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            default_page_size: 50,
            max_page_size: 500,
            denial_write_timeout_ms: 2_000,
        }
    }
}

/// Administrator created on startup when the user table is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub admin_username: String,
    /// No account is created unless this is set.
    pub admin_password: Option<String>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            admin_username: "admin".to_string(),
            admin_password: None,
        }
    }
}
