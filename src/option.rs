//! Parsing of whitelist role options.
//!
//! Whitelist changes arrive as role options on an `ALTER ROLE` statement:
//!
//! ```text
//! ALTER ROLE r WITH OPTIONS = { 'grant_audit_whitelist_for_select' : 'data/ks' }
//! ```
//!
//! The key selects grant or revoke and the operation(s); the value is a
//! resource spec. Only one whitelist option is accepted per statement.

use std::collections::BTreeMap;

use crate::catalog::SchemaCatalog;
use crate::error::ParseError;
use crate::operation::{OperationSet, OperationSpec};
use crate::resource::Resource;

/// Key prefix of a whitelist grant option.
pub const GRANT_PREFIX: &str = "grant_audit_whitelist_for_";
/// Key prefix of a whitelist revoke option.
pub const REVOKE_PREFIX: &str = "revoke_audit_whitelist_for_";

/// Whether a mutation adds or removes operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// Add operations to the whitelist
    Grant,
    /// Remove operations from the whitelist
    Revoke,
}

/// A single whitelist change for one resource.
///
/// `operations` is always a subset of the operations legal for the
/// resource's kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    /// Grant or revoke
    pub kind: MutationKind,
    /// Operations affected
    pub operations: OperationSet,
    /// Resource the entry is keyed on
    pub resource: Resource,
}

impl Mutation {
    /// Creates a grant, narrowed to the operations legal on `resource`.
    pub fn grant(resource: Resource, operations: OperationSet) -> Self {
        Self::new(MutationKind::Grant, resource, operations)
    }

    /// Creates a revoke, narrowed to the operations legal on `resource`.
    pub fn revoke(resource: Resource, operations: OperationSet) -> Self {
        Self::new(MutationKind::Revoke, resource, operations)
    }

    fn new(kind: MutationKind, resource: Resource, operations: OperationSet) -> Self {
        let legal = OperationSet::legal_for(resource.kind());
        Self {
            kind,
            operations: operations.intersection(legal),
            resource,
        }
    }
}

/// Returns true if `key` is a whitelist option key (valid or not).
pub fn is_whitelist_option(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.starts_with(GRANT_PREFIX) || key.starts_with(REVOKE_PREFIX)
}

/// Parses one whitelist option into a mutation.
///
/// The key is matched case-insensitively. `_for_all` narrows silently to
/// the operations legal on the resource; a named operation that is not
/// legal there is rejected.
///
/// # Errors
///
/// Returns [`ParseError`] for an unknown key or operation, an illegal
/// operation, or a malformed resource spec.
///
/// # Examples
///
/// ```
/// use audit_whitelist::{parse_option, MutationKind, Operation, Resource};
///
/// let m = parse_option("grant_audit_whitelist_for_all", "connections").unwrap();
/// assert_eq!(m.kind, MutationKind::Grant);
/// assert_eq!(m.resource, Resource::Connection);
/// assert!(m.operations.contains(Operation::Execute));
/// assert!(!m.operations.contains(Operation::Select));
/// ```
pub fn parse_option(key: &str, value: &str) -> Result<Mutation, ParseError> {
    let lower = key.to_ascii_lowercase();
    let (kind, suffix) = if let Some(suffix) = lower.strip_prefix(GRANT_PREFIX) {
        (MutationKind::Grant, suffix)
    } else if let Some(suffix) = lower.strip_prefix(REVOKE_PREFIX) {
        (MutationKind::Revoke, suffix)
    } else {
        return Err(ParseError::UnknownOptionKey(key.to_string()));
    };

    let spec = OperationSpec::parse_suffix(suffix)?;
    let resource = Resource::parse(value)?;
    let operations = spec.resolve(resource.kind(), value)?;

    Ok(Mutation {
        kind,
        operations,
        resource,
    })
}

/// Extracts the whitelist mutation from a statement's full option map.
///
/// Options that are not whitelist keys belong to the host and are
/// ignored. Resources that do not exist in `catalog` are still accepted.
///
/// # Errors
///
/// Returns [`ParseError::MultipleWhitelistOptions`] if the map holds two or
/// more whitelist keys, or any error from [`parse_option`].
pub fn parse_options<C: SchemaCatalog + ?Sized>(
    options: &BTreeMap<String, String>,
    catalog: &C,
) -> Result<Option<Mutation>, ParseError> {
    let mut whitelist_options = options.iter().filter(|(key, _)| is_whitelist_option(key));

    let Some((key, value)) = whitelist_options.next() else {
        return Ok(None);
    };
    let extra = whitelist_options.count();
    if extra > 0 {
        return Err(ParseError::MultipleWhitelistOptions(extra + 1));
    }

    let mutation = parse_option(key, value)?;
    if !mutation.resource.exists(catalog) {
        tracing::debug!(
            target: "audit_whitelist",
            resource = %mutation.resource,
            "whitelist targets a resource that does not exist yet"
        );
    }
    Ok(Some(mutation))
}
