use std::collections::HashSet;

use crate::catalog::RoleCatalog;
use crate::config::{AuditConfig, FilterType};
use crate::error::ConfigError;
use crate::evaluator::ExemptionEvaluator;
use crate::operation::Operation;
use crate::resource::Resource;

/// Decides, per audited event, whether the event is logged.
///
/// Combines the static user list from the configuration file with role
/// whitelists, as selected by [`FilterType`].
#[derive(Debug, Clone)]
pub struct AuditFilter {
    filter_type: FilterType,
    yaml_users: HashSet<String>,
}

impl AuditFilter {
    /// Builds the filter selected by the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoConfigFile`] if the filter type needs the
    /// static whitelist but the configuration was not read from a file.
    pub fn from_config(config: &AuditConfig) -> Result<Self, ConfigError> {
        let yaml_users = match config.filter_type {
            FilterType::Yaml | FilterType::YamlAndRole => {
                config.yaml_whitelist()?.iter().cloned().collect()
            }
            FilterType::None | FilterType::Role => HashSet::new(),
        };
        Ok(Self {
            filter_type: config.filter_type,
            yaml_users,
        })
    }

    /// Returns the active filter type.
    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    /// Returns true if the event should not be logged.
    ///
    /// `user` is the authenticated user; `user_roles` are the roles it holds
    /// (normally just the user's own role).
    pub fn is_whitelisted<C, I, S>(
        &self,
        roles: &C,
        user: &str,
        user_roles: I,
        operation: Operation,
        resource: &Resource,
    ) -> bool
    where
        C: RoleCatalog + ?Sized,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let by_yaml = || self.yaml_users.contains(user);
        let by_role =
            || ExemptionEvaluator::new(roles).is_exempt(user_roles, operation, resource);

        match self.filter_type {
            FilterType::None => false,
            FilterType::Yaml => by_yaml(),
            FilterType::Role => by_role(),
            FilterType::YamlAndRole => by_yaml() || by_role(),
        }
    }
}
