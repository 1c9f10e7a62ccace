//! Per-role whitelist storage.
//!
//! Entries are keyed by the exact resource. A grant on `data/ks` and a
//! revoke on `data/ks/tbl` touch different entries; only the evaluator's
//! ancestor walk lets a parent entry cover a child resource.

use std::collections::BTreeMap;

use crate::operation::{Operation, OperationSet};
use crate::option::{Mutation, MutationKind};
use crate::resource::Resource;
use crate::role::RoleRecord;

/// Whitelist entries of a single role: resource to exempted operations.
///
/// An entry never holds an empty operation set, nor an operation outside
/// [`OperationSet::legal_for`] its resource kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Whitelist {
    entries: BTreeMap<Resource, OperationSet>,
}

impl Whitelist {
    /// Creates an empty whitelist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `operations` to the entry for `resource`, creating it if absent.
    ///
    /// Operations that cannot occur on the resource kind are dropped, so
    /// persisted options and hand-built mutations obey the same rule as
    /// parsed ones.
    pub fn grant(&mut self, resource: Resource, operations: OperationSet) {
        let operations = operations.intersection(OperationSet::legal_for(resource.kind()));
        if operations.is_empty() {
            return;
        }
        let entry = self.entries.entry(resource).or_default();
        *entry = entry.union(operations);
    }

    /// Removes `operations` from the entry for `resource`.
    ///
    /// The entry is dropped once its operation set is empty.
    pub fn revoke(&mut self, resource: &Resource, operations: OperationSet) {
        if let Some(entry) = self.entries.get_mut(resource) {
            *entry = entry.difference(operations);
            if entry.is_empty() {
                self.entries.remove(resource);
            }
        }
    }

    /// Applies a parsed mutation.
    pub fn apply(&mut self, mutation: &Mutation) {
        match mutation.kind {
            MutationKind::Grant => self.grant(mutation.resource.clone(), mutation.operations),
            MutationKind::Revoke => self.revoke(&mutation.resource, mutation.operations),
        }
    }

    /// Returns the operations whitelisted on exactly `resource`.
    pub fn operations(&self, resource: &Resource) -> OperationSet {
        self.entries.get(resource).copied().unwrap_or_default()
    }

    /// Returns true if `operation` is whitelisted on exactly `resource`.
    pub fn contains(&self, resource: &Resource, operation: Operation) -> bool {
        self.operations(resource).contains(operation)
    }

    /// Iterates entries in resource order.
    pub fn iter(&self) -> impl Iterator<Item = (&Resource, OperationSet)> {
        self.entries.iter().map(|(r, ops)| (r, *ops))
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the whitelist has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(Resource, OperationSet)> for Whitelist {
    fn from_iter<I: IntoIterator<Item = (Resource, OperationSet)>>(iter: I) -> Self {
        let mut whitelist = Whitelist::new();
        for (resource, operations) in iter {
            whitelist.grant(resource, operations);
        }
        whitelist
    }
}

/// Applies a mutation to the whitelist of `role`.
///
/// This does no authorization; callers run [`GrantAuthorizer`](crate::GrantAuthorizer) first.
pub fn apply(role: &mut RoleRecord, mutation: &Mutation) {
    role.whitelist.apply(mutation);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::Operation::*;
    use crate::resource::ResourceKind;

    fn ops(list: &[Operation]) -> OperationSet {
        list.iter().copied().collect()
    }

    #[test]
    fn grant_merges_into_existing_entry() {
        let mut role = RoleRecord::new("temporary_user");
        apply(&mut role, &Mutation::grant(Resource::root_data(), ops(&[Select])));
        apply(&mut role, &Mutation::grant(Resource::root_data(), ops(&[Modify])));

        assert_eq!(role.whitelist.len(), 1);
        assert_eq!(role.whitelist.operations(&Resource::root_data()), ops(&[Select, Modify]));
    }

    #[test]
    fn revoke_subtracts_operations() {
        let mut role = RoleRecord::new("temporary_user");
        let all_data = OperationSet::legal_for(ResourceKind::Data);
        apply(&mut role, &Mutation::grant(Resource::root_data(), all_data));
        apply(&mut role, &Mutation::revoke(Resource::root_data(), ops(&[Modify])));
        apply(&mut role, &Mutation::revoke(Resource::root_data(), ops(&[Drop])));

        assert_eq!(
            role.whitelist.operations(&Resource::root_data()),
            ops(&[Create, Alter, Select, Authorize])
        );
    }

    #[test]
    fn emptied_entry_is_removed() {
        let mut whitelist = Whitelist::new();
        whitelist.grant(Resource::Connection, ops(&[Execute]));
        whitelist.revoke(&Resource::Connection, ops(&[Execute, Authorize]));

        assert!(whitelist.is_empty());
    }

    #[test]
    fn entries_are_keyed_by_exact_resource() {
        let mut whitelist = Whitelist::new();
        whitelist.grant(Resource::keyspace("ks"), ops(&[Select]));
        whitelist.revoke(&Resource::table("ks", "tbl"), ops(&[Select]));

        assert!(whitelist.contains(&Resource::keyspace("ks"), Select));
        assert!(!whitelist.contains(&Resource::table("ks", "tbl"), Select));
        assert_eq!(whitelist.len(), 1);
    }

    #[test]
    fn revoke_on_missing_entry_is_noop() {
        let mut whitelist = Whitelist::new();
        whitelist.revoke(&Resource::root_roles(), ops(&[Describe]));
        assert!(whitelist.is_empty());
    }

    #[test]
    fn grant_keeps_only_legal_operations() {
        let mut whitelist = Whitelist::new();
        whitelist.grant(Resource::Connection, ops(&[Select, Execute]));
        whitelist.grant(Resource::root_roles(), ops(&[Select, Modify]));

        assert_eq!(whitelist.operations(&Resource::Connection), ops(&[Execute]));
        assert_eq!(whitelist.len(), 1);
    }

    #[test]
    fn hand_built_mutation_cannot_bypass_legality() {
        let mut role = RoleRecord::new("temporary_user");
        let mutation = Mutation {
            kind: MutationKind::Grant,
            operations: OperationSet::all(),
            resource: Resource::table("ecks", "ectbl"),
        };
        apply(&mut role, &mutation);

        assert_eq!(
            role.whitelist.operations(&Resource::table("ecks", "ectbl")),
            OperationSet::legal_for(ResourceKind::Data)
        );
    }

    #[test]
    fn collecting_entries_narrows_like_grant() {
        let whitelist: Whitelist = [
            (Resource::root_data(), ops(&[Select, Execute])),
            (Resource::Connection, ops(&[Describe])),
        ]
        .into_iter()
        .collect();

        assert_eq!(whitelist.len(), 1);
        assert_eq!(whitelist.operations(&Resource::root_data()), ops(&[Select]));
    }

    #[test]
    fn empty_grant_creates_no_entry() {
        let mut whitelist = Whitelist::new();
        whitelist.grant(Resource::root_data(), OperationSet::empty());
        assert!(whitelist.is_empty());
    }
}
