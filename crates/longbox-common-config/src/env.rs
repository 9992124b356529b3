//! Environment variable handling.

use crate::types::LongboxConfig;
use std::env;
use tracing::warn;

/// Environment variable names.
pub mod vars {
    /// Server-side RBAC enforcement flag.
    pub const RBAC_ENABLED: &str = "LONGBOX_RBAC_ENABLED";
    /// Client-visible mirror of the RBAC flag.
    pub const PUBLIC_RBAC_ENABLED: &str = "LONGBOX_PUBLIC_RBAC_ENABLED";

    pub const SESSION_SECRET: &str = "LONGBOX_SESSION_SECRET";
    pub const SESSION_COOKIE: &str = "LONGBOX_SESSION_COOKIE";
    pub const SESSION_TTL_SECS: &str = "LONGBOX_SESSION_TTL_SECS";
    pub const SESSION_SECURE: &str = "LONGBOX_SESSION_SECURE";

    pub const DATABASE_PATH: &str = "LONGBOX_DATABASE_PATH";
    pub const HOST: &str = "LONGBOX_HOST";
    pub const PORT: &str = "LONGBOX_PORT";
    pub const CONFIG_DIR: &str = "LONGBOX_CONFIG_DIR";

    pub const ADMIN_USERNAME: &str = "LONGBOX_ADMIN_USERNAME";
    pub const ADMIN_PASSWORD: &str = "LONGBOX_ADMIN_PASSWORD";

    pub const APP_ENV: &str = "LONGBOX_ENV";
}

/// Interpret a flag value. Only `"true"` (any case, surrounding whitespace ignored) is on.
pub fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// Environment helpers.
pub struct Environment;

impl Environment {
    /// Load `.env`, `.env.local` and `.env.<LONGBOX_ENV>` (later files override earlier ones).
    pub fn init() {
        let _ = dotenvy::from_filename(".env");
        let _ = dotenvy::from_filename(".env.local");

        if let Ok(app_env) = env::var(vars::APP_ENV) {
            let _ = dotenvy::from_filename(format!(".env.{}", app_env));
        }
    }

    /// Get an optional string variable.
    pub fn get(var: &str) -> Option<String> {
        env::var(var).ok()
    }

    /// Get a variable with a default value.
    pub fn get_or(var: &str, default: &str) -> String {
        env::var(var).unwrap_or_else(|_| default.to_string())
    }

    /// Apply `LONGBOX_*` overrides from the process environment.
    pub fn apply_overrides(config: &mut LongboxConfig) {
        apply_overrides_from(config, |key| env::var(key).ok());
    }
}

/// Apply overrides from an arbitrary lookup. Unparseable numbers are ignored with a warning.
pub fn apply_overrides_from(config: &mut LongboxConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup(vars::RBAC_ENABLED) {
        config.features.rbac_enabled = parse_flag(&v);
    }
    if let Some(v) = lookup(vars::PUBLIC_RBAC_ENABLED) {
        config.features.public_rbac_enabled = parse_flag(&v);
    }
    if let Some(v) = lookup(vars::SESSION_SECRET) {
        config.session.secret = v;
    }
    if let Some(v) = lookup(vars::SESSION_COOKIE) {
        config.session.cookie_name = v;
    }
    if let Some(v) = lookup(vars::SESSION_TTL_SECS) {
        match v.parse() {
            Ok(ttl) => config.session.ttl_secs = ttl,
            Err(_) => warn!(var = vars::SESSION_TTL_SECS, value = %v, "Ignoring invalid number"),
        }
    }
    if let Some(v) = lookup(vars::SESSION_SECURE) {
        config.session.secure_cookie = parse_flag(&v);
    }
    if let Some(v) = lookup(vars::DATABASE_PATH) {
        config.database.path = v;
    }
    if let Some(v) = lookup(vars::ADMIN_USERNAME) {
        config.bootstrap.admin_username = v;
    }
    if let Some(v) = lookup(vars::ADMIN_PASSWORD) {
        config.bootstrap.admin_password = Some(v);
    }
    if let Some(v) = lookup(vars::HOST) {
        config.server.host = v;
    }
    if let Some(v) = lookup(vars::PORT) {
        match v.parse() {
            Ok(port) => config.server.port = port,
            Err(_) => warn!(var = vars::PORT, value = %v, "Ignoring invalid port"),
        }
    }
}
