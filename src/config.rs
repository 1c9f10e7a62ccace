//! Audit configuration.
//!
//! Loaded once at startup and passed by reference to whatever needs it.
//!
//! ```yaml
//! whitelist:
//!   - cassandra_admin
//! logger_backend:
//!   class_name: tracing
//!   parameters:
//!     target: audit
//! post_logging: false
//! filter_type: yaml_and_role
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "AUDIT_WHITELIST_CONFIG";

/// Default logger backend.
pub const DEFAULT_LOGGER_BACKEND: &str = "tracing";

/// Which whitelists decide whether an event is exempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// Nothing is exempt
    None,
    /// Only the static user list from the configuration file
    Yaml,
    /// Only role whitelists
    #[default]
    Role,
    /// Either of the two
    YamlAndRole,
}

/// Logger backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggerBackend {
    /// Backend identifier
    pub class_name: String,
    /// Backend-specific parameters
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl Default for LoggerBackend {
    fn default() -> Self {
        Self {
            class_name: DEFAULT_LOGGER_BACKEND.to_string(),
            parameters: BTreeMap::new(),
        }
    }
}

/// Audit configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    /// Users whose events are never audited
    whitelist: Vec<String>,
    /// Where audit records go
    pub logger_backend: LoggerBackend,
    /// Log after the operation completed rather than before
    pub post_logging: bool,
    /// Authorizer the audit layer delegates to
    pub wrapped_authorizer: Option<String>,
    /// Component that hides bound values in logged statements
    pub bound_value_suppressor: Option<String>,
    /// Which whitelists apply
    pub filter_type: FilterType,
    #[serde(skip)]
    source: Option<PathBuf>,
}

impl AuditConfig {
    /// Loads the configuration from `path`.
    ///
    /// A missing path (or `None`) yields the defaults, without a static
    /// whitelist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or parsed,
    /// or holds an invalid value.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path.filter(|p| p.exists()) else {
            tracing::debug!(
                target: "audit_whitelist",
                "no audit configuration file, using defaults"
            );
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml(&content)?;
        config.source = Some(path.to_path_buf());

        tracing::info!(
            target: "audit_whitelist",
            path = %path.display(),
            filter_type = ?config.filter_type,
            "loaded audit configuration"
        );
        Ok(config)
    }

    /// Loads the configuration from the file named by `AUDIT_WHITELIST_CONFIG`.
    ///
    /// An unset variable yields the defaults, like [`AuditConfig::load`] with
    /// `None`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        Self::load(path.as_deref())
    }

    /// Parses configuration text without tying it to a file.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.logger_backend.class_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "logger_backend.class_name cannot be empty".to_string(),
            ));
        }
        if self.whitelist.iter().any(|user| user.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "whitelist entries cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns true if the configuration was read from a file.
    pub fn is_from_file(&self) -> bool {
        self.source.is_some()
    }

    /// Returns the static user whitelist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoConfigFile`] if the configuration was not
    /// read from a file.
    pub fn yaml_whitelist(&self) -> Result<&[String], ConfigError> {
        if !self.is_from_file() {
            return Err(ConfigError::NoConfigFile);
        }
        Ok(&self.whitelist)
    }
}
