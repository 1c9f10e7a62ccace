use std::collections::BTreeSet;

use crate::store::Whitelist;

/// A role as seen by the whitelist engine.
///
/// The host owns role storage; this is the materialized view the engine
/// needs: the roles granted to this one and its whitelist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleRecord {
    /// Role name
    pub name: String,
    /// Roles granted directly to this role
    pub granted_roles: BTreeSet<String>,
    /// Whitelist entries owned by this role
    pub whitelist: Whitelist,
}

impl RoleRecord {
    /// Creates a role with no granted roles and an empty whitelist.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a directly granted role.
    pub fn with_granted_role(mut self, role: impl Into<String>) -> Self {
        self.granted_roles.insert(role.into());
        self
    }

    /// Replaces the whitelist.
    pub fn with_whitelist(mut self, whitelist: Whitelist) -> Self {
        self.whitelist = whitelist;
        self
    }
}
