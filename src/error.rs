use std::path::PathBuf;

use thiserror::Error;

use crate::authorizer::DenialReason;

/// Errors that can occur while managing or evaluating audit whitelists.
///
/// Each variant wraps the error family of one stage of the pipeline, so
/// host glue can propagate any of them with `?`.
#[derive(Debug, Error)]
pub enum Error {
    /// A resource spec string was malformed
    #[error(transparent)]
    Resource(#[from] ResourceError),
    /// A whitelist option could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The acting role may not apply the mutation
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// The audit configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The target role of a statement does not exist
    #[error("role '{0}' does not exist")]
    UnknownRole(String),
    /// A role with this name already exists
    #[error("role '{0}' already exists")]
    RoleExists(String),
}

impl Error {
    /// Returns true if the error should surface as a rejected (invalid) statement.
    pub fn is_syntax(&self) -> bool {
        matches!(self, Error::Resource(_) | Error::Parse(_))
    }

    /// Returns true if the error should surface as a permission denial.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Auth(AuthError::Unauthorized { .. }))
    }
}

/// A resource spec string that can never name a valid resource.
///
/// Only malformed specs produce this error. A well-formed spec naming a
/// keyspace, table or role that does not exist yet is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// The spec was empty
    #[error("empty resource")]
    Empty,
    /// The first segment is not `data`, `roles` or `connections`
    #[error("unknown resource root '{0}'")]
    UnknownRoot(String),
    /// More segments than the resource kind allows
    #[error("too many segments in resource '{spec}' (at most {max})")]
    TooManySegments {
        /// The offending spec
        spec: String,
        /// Maximum number of segments for this root
        max: usize,
    },
    /// A segment is empty or contains characters outside `[A-Za-z0-9_]`
    #[error("invalid identifier '{segment}' in resource '{spec}'")]
    InvalidIdentifier {
        /// The offending spec
        spec: String,
        /// The segment that failed validation
        segment: String,
    },
    /// The root never takes a qualifier (`connections/...`)
    #[error("resource '{0}' does not accept a qualifier")]
    QualifierNotAllowed(String),
}

/// A whitelist option (key or value) that could not be turned into a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The key is not `grant_audit_whitelist_for_<op>` or `revoke_audit_whitelist_for_<op>`
    #[error("unknown whitelist option '{0}'")]
    UnknownOptionKey(String),
    /// The `<op>` suffix is not an operation name or `all`
    #[error("unknown operation '{0}'")]
    UnknownOperation(String),
    /// An explicitly named operation is not legal on the resource kind
    #[error("operation {operation} is not applicable to resource '{resource}'")]
    IllegalOperation {
        /// Operation name as requested
        operation: String,
        /// Resource spec the operation was requested for
        resource: String,
    },
    /// More than one whitelist option in a single statement
    #[error("only one whitelist option per statement is allowed, got {0}")]
    MultipleWhitelistOptions(usize),
    /// The option value is not a valid resource spec
    #[error("invalid resource: {0}")]
    Resource(#[from] ResourceError),
}

/// Authorization failure while applying a whitelist mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The acting role may not apply the mutation
    #[error("role '{role}' is not authorized: {reason}")]
    Unauthorized {
        /// The acting role
        role: String,
        /// Which rule denied the mutation
        reason: DenialReason,
    },
}

impl AuthError {
    /// Returns the rule that denied the mutation.
    pub fn reason(&self) -> &DenialReason {
        match self {
            AuthError::Unauthorized { reason, .. } => reason,
        }
    }
}

/// Errors loading or querying the audit configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("failed to read audit configuration '{path}': {source}")]
    Io {
        /// Path of the configuration file
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },
    /// The configuration file is not valid YAML for this schema
    #[error("invalid audit configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// A file-backed feature was requested without a configuration file
    #[error("no audit configuration file found for yaml based whitelist")]
    NoConfigFile,
    /// The configuration parsed but holds an unusable value
    #[error("invalid audit configuration: {0}")]
    Invalid(String),
}
