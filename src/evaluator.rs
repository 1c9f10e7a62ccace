//! Runtime exemption check.
//!
//! Called once per audited event. An event is exempt when any role the
//! actor holds, directly or through granted roles, whitelists the
//! operation on the event's resource or one of its ancestors.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use crate::catalog::RoleCatalog;
use crate::operation::Operation;
use crate::resource::Resource;
use crate::role::RoleRecord;

/// Answers whether an audit event should be suppressed.
///
/// Holds only a reference to the role catalog, so it is cheap to create
/// per event and safe to share between threads when the catalog is.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use std::sync::Arc;
/// use audit_whitelist::{ExemptionEvaluator, Operation, Resource, RoleRecord, parse_option};
///
/// let mut role = RoleRecord::new("whitelist_role");
/// role.whitelist.apply(&parse_option("grant_audit_whitelist_for_all", "data").unwrap());
///
/// let user = RoleRecord::new("trusted_user").with_granted_role("whitelist_role");
///
/// let mut roles = HashMap::new();
/// roles.insert(role.name.clone(), Arc::new(role));
/// roles.insert(user.name.clone(), Arc::new(user));
///
/// let evaluator = ExemptionEvaluator::new(&roles);
/// let table = Resource::table("ecks", "ectbl");
/// assert!(evaluator.is_exempt(["trusted_user"], Operation::Select, &table));
/// assert!(!evaluator.is_exempt(["trusted_user"], Operation::Execute, &Resource::Connection));
/// ```
pub struct ExemptionEvaluator<'a, C: ?Sized> {
    roles: &'a C,
}

impl<'a, C: RoleCatalog + ?Sized> ExemptionEvaluator<'a, C> {
    /// Creates an evaluator over the host's role catalog.
    pub fn new(roles: &'a C) -> Self {
        Self { roles }
    }

    /// Returns true if `operation` on `resource` is whitelisted for the actor.
    ///
    /// Roles are checked as the walk reaches them and the walk stops at the
    /// first hit. Missing roles are skipped; absence of data means "not
    /// exempt".
    pub fn is_exempt<I, S>(&self, actor_roles: I, operation: Operation, resource: &Resource) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let chain = resource.ancestors();
        self.walk(actor_roles, |role| {
            let hit = chain.iter().find(|r| role.whitelist.contains(r, operation));
            let Some(covering) = hit else {
                return false;
            };
            tracing::trace!(
                target: "audit_whitelist",
                role = %role.name,
                whitelisted = %covering,
                resource = %resource,
                %operation,
                "audit event exempt"
            );
            true
        })
    }

    /// Returns true if `role` is one of the actor's roles or is granted to
    /// them, transitively.
    pub fn inherits<I, S>(&self, actor_roles: I, role: &str) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.walk(actor_roles, |record| record.name == role)
    }

    /// Resolves the actor's roles and every role granted to them, transitively.
    ///
    /// Each role is visited once, so cycles in the grant graph terminate.
    /// Roles the catalog does not know are left out.
    pub fn role_closure<I, S>(&self, actor_roles: I) -> Vec<Arc<RoleRecord>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut closure = Vec::new();
        self.walk(actor_roles, |record| {
            closure.push(Arc::clone(record));
            false
        });
        closure
    }

    /// Breadth-first walk over the grant graph, stopping once `visit`
    /// returns true. Returns whether it stopped early.
    fn walk<I, S, F>(&self, actor_roles: I, mut visit: F) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnMut(&Arc<RoleRecord>) -> bool,
    {
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<String> = VecDeque::new();

        for name in actor_roles {
            let name = name.as_ref();
            if visited.insert(name.to_string()) {
                queue.push_back(name.to_string());
            }
        }

        while let Some(name) = queue.pop_front() {
            let Some(record) = self.roles.lookup(&name) else {
                continue;
            };
            if visit(&record) {
                return true;
            }
            for granted in &record.granted_roles {
                if visited.insert(granted.clone()) {
                    queue.push_back(granted.clone());
                }
            }
        }

        false
    }
}
