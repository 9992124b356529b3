//! Configuration file loading and validation.

use crate::env::Environment;
use crate::types::LongboxConfig;
use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Minimum length of the session signing secret.
pub const MIN_SESSION_SECRET_LEN: usize = 32;

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ParseError { line: Option<usize>, message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },

    #[error("invalid configuration: {}", problems.join("; "))]
    Invalid { problems: Vec<String> },
}

/// Configuration loader.
pub struct ConfigLoader {
    base_path: PathBuf,
}

impl ConfigLoader {
    /// Create a loader for the given configuration directory.
    pub fn new(config_dir: impl AsRef<Path>) -> Self {
        Self {
            base_path: config_dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the YAML file this loader reads.
    pub fn config_path(&self) -> PathBuf {
        self.base_path.join("longbox.yaml")
    }

    /// Load `longbox.yaml` (defaults if absent), apply environment overrides, validate.
    pub fn load(&self) -> Result<LongboxConfig, ConfigError> {
        let mut config = self.load_file()?;
        Environment::apply_overrides(&mut config);
        validate(&config)?;
        Ok(config)
    }

    /// Load only the YAML file, without environment overrides or validation.
    pub fn load_file(&self) -> Result<LongboxConfig, ConfigError> {
        let config_path = self.config_path();

        if !config_path.exists() {
            return Ok(LongboxConfig::default());
        }

        info!(path = %config_path.display(), "Loading config file");
        let contents = std::fs::read_to_string(&config_path)?;
        let expanded = expand_env_vars(&contents, |var| std::env::var(var).ok())?;

        serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
            line: e.location().map(|l| l.line()),
            message: e.to_string(),
        })
    }
}

/// Expand `${VAR}` and `${VAR:-default}` references.
pub fn expand_env_vars(
    content: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").map_err(|e| ConfigError::ParseError {
        line: None,
        message: e.to_string(),
    })?;
    let mut result = content.to_string();

    for cap in re.captures_iter(content) {
        let full_match = &cap[0];
        let var_name = &cap[1];

        let value = match lookup(var_name) {
            Some(v) => v,
            None => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                None => {
                    return Err(ConfigError::EnvVarNotFound {
                        var: var_name.to_string(),
                    })
                }
            },
        };

        result = result.replace(full_match, &value);
    }

    Ok(result)
}

/// Validate a configuration, collecting every problem.
pub fn validate(config: &LongboxConfig) -> Result<(), ConfigError> {
    let mut problems = Vec::new();

    if config.session.secret.len() < MIN_SESSION_SECRET_LEN {
        problems.push(format!(
            "session.secret must be at least {} bytes",
            MIN_SESSION_SECRET_LEN
        ));
    }
    if config.session.cookie_name.trim().is_empty() {
        problems.push("session.cookie_name must not be empty".to_string());
    }
    if config.session.ttl_secs == 0 {
        problems.push("session.ttl_secs must be greater than 0".to_string());
    }
    if config.database.path.trim().is_empty() {
        problems.push("database.path must not be empty".to_string());
    }
    if config.database.max_connections == 0 {
        problems.push("database.max_connections must be at least 1".to_string());
    }
    if let Some(password) = &config.bootstrap.admin_password {
        if password.len() < 8 {
            problems.push("bootstrap.admin_password must be at least 8 characters".to_string());
        }
        if config.bootstrap.admin_username.trim().is_empty() {
            problems.push("bootstrap.admin_username must not be empty".to_string());
        }
    }
    if config.server.port == 0 {
        problems.push("server.port must not be 0".to_string());
    }
    if config.audit.default_page_size == 0
        || config.audit.default_page_size > config.audit.max_page_size
    {
        problems.push("audit.default_page_size must be between 1 and audit.max_page_size".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Invalid { problems })
    }
}
