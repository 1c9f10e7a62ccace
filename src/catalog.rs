//! Collaborators supplied by the host database.
//!
//! The engine never owns schema, roles or permissions. It asks the host
//! through these traits, all of which are synchronous lookups into state
//! the host already keeps cached.
//!
//! [`SchemaSnapshot`] and [`PermissionTable`] are plain in-memory
//! implementations for embedding and tests.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use crate::resource::Resource;
use crate::role::RoleRecord;

/// Answers whether schema objects and roles exist.
pub trait SchemaCatalog {
    /// Returns true if the keyspace exists.
    fn keyspace_exists(&self, keyspace: &str) -> bool;

    /// Returns true if the table exists in the keyspace.
    fn table_exists(&self, keyspace: &str, table: &str) -> bool;

    /// Returns true if the role exists.
    fn role_exists(&self, role: &str) -> bool;
}

/// Looks up role records by name.
///
/// Records are shared snapshots: a lookup never observes a partially
/// applied change.
pub trait RoleCatalog {
    /// Returns the current record of the role, if it exists.
    fn lookup(&self, name: &str) -> Option<Arc<RoleRecord>>;
}

impl RoleCatalog for HashMap<String, Arc<RoleRecord>> {
    fn lookup(&self, name: &str) -> Option<Arc<RoleRecord>> {
        self.get(name).cloned()
    }
}

/// Answers permission questions about roles.
pub trait PermissionChecker {
    /// Returns true if the role is a superuser.
    fn is_superuser(&self, role: &str) -> bool;

    /// Returns true if the role holds AUTHORIZE on exactly `resource`.
    ///
    /// Callers that need ancestor coverage walk [`Resource::ancestors`].
    fn has_authorize(&self, role: &str, resource: &Resource) -> bool;
}

/// In-memory [`SchemaCatalog`].
#[derive(Debug, Clone, Default)]
pub struct SchemaSnapshot {
    keyspaces: HashSet<String>,
    tables: HashMap<String, HashSet<String>>,
    roles: HashSet<String>,
}

impl SchemaSnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a keyspace.
    pub fn with_keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspaces.insert(keyspace.into());
        self
    }

    /// Adds a table and its keyspace.
    pub fn with_table(mut self, keyspace: impl Into<String>, table: impl Into<String>) -> Self {
        let keyspace = keyspace.into();
        self.keyspaces.insert(keyspace.clone());
        self.tables.entry(keyspace).or_default().insert(table.into());
        self
    }

    /// Adds a role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }
}

impl SchemaCatalog for SchemaSnapshot {
    fn keyspace_exists(&self, keyspace: &str) -> bool {
        self.keyspaces.contains(keyspace)
    }

    fn table_exists(&self, keyspace: &str, table: &str) -> bool {
        self.tables
            .get(keyspace)
            .is_some_and(|tables| tables.contains(table))
    }

    fn role_exists(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// In-memory [`PermissionChecker`]: superusers and AUTHORIZE grants.
#[derive(Debug, Clone, Default)]
pub struct PermissionTable {
    superusers: HashSet<String>,
    authorize: HashMap<String, BTreeSet<Resource>>,
}

impl PermissionTable {
    /// Creates a table with no superusers and no grants.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a role as superuser.
    pub fn with_superuser(mut self, role: impl Into<String>) -> Self {
        self.superusers.insert(role.into());
        self
    }

    /// Grants AUTHORIZE on `resource` to a role.
    pub fn with_authorize(mut self, role: impl Into<String>, resource: Resource) -> Self {
        self.authorize.entry(role.into()).or_default().insert(resource);
        self
    }
}

impl PermissionChecker for PermissionTable {
    fn is_superuser(&self, role: &str) -> bool {
        self.superusers.contains(role)
    }

    fn has_authorize(&self, role: &str, resource: &Resource) -> bool {
        self.authorize
            .get(role)
            .is_some_and(|resources| resources.contains(resource))
    }
}
