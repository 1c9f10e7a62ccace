use std::fmt;

use crate::catalog::{PermissionChecker, RoleCatalog};
use crate::error::AuthError;
use crate::evaluator::ExemptionEvaluator;
use crate::option::Mutation;
use crate::resource::Resource;
use crate::role::RoleRecord;

/// Why a whitelist mutation was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    /// Whitelist options are not allowed when creating a role
    CreateRoleStatement,
    /// The actor lacks AUTHORIZE on the resource and all its ancestors
    MissingAuthorize {
        /// The resource of the mutation
        resource: Resource,
    },
    /// A non-superuser tried to change its own whitelist or that of a
    /// role it inherits
    SelfWhitelist,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::CreateRoleStatement => write!(
                f,
                "whitelist options are only allowed when altering an existing role"
            ),
            DenialReason::MissingAuthorize { resource } => {
                write!(f, "AUTHORIZE permission required on '{}'", resource)
            }
            DenialReason::SelfWhitelist => {
                write!(f, "a role may not change its own whitelist or one it inherits")
            }
        }
    }
}

/// Proof that a whitelist mutation passed authorization.
///
/// Zero-sized and only constructed by [`GrantAuthorizer::authorize`];
/// committing a mutation to shared role state requires one.
#[derive(Debug, Clone, Copy)]
pub struct GrantCap {
    // Private field prevents construction outside the crate
    _private: (),
}

impl GrantCap {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

/// Decides whether an actor may apply a whitelist mutation to a target role.
///
/// Rules are checked in order; the first failing rule denies:
///
/// 1. No whitelist mutation inside a role-creation statement.
/// 2. A superuser is always authorized.
/// 3. The actor must hold AUTHORIZE on the resource or one of its ancestors.
/// 4. The actor may not target itself or any role granted to it, directly
///    or transitively, since it would inherit that whitelist.
///
/// Whether the actor may change other attributes of the target (such as
/// its password) is left to the host.
///
/// # Examples
///
/// ```
/// use audit_whitelist::{
///     parse_option, GrantAuthorizer, PermissionTable, Resource, RoleDirectory, RoleRecord,
/// };
///
/// let roles = RoleDirectory::new();
/// let perms = PermissionTable::new().with_authorize("authorized_user", Resource::root_data());
/// let authorizer = GrantAuthorizer::new(&perms, &roles);
///
/// let actor = RoleRecord::new("authorized_user").with_granted_role("helper");
/// let other = RoleRecord::new("other_user");
/// let mutation = parse_option("grant_audit_whitelist_for_all", "data").unwrap();
///
/// assert!(authorizer.authorize(&actor, &mutation, &other, false).is_ok());
/// assert!(authorizer.authorize(&actor, &mutation, &actor, false).is_err());
/// assert!(authorizer
///     .authorize(&actor, &mutation, &RoleRecord::new("helper"), false)
///     .is_err());
/// ```
pub struct GrantAuthorizer<'a, P: ?Sized, C: ?Sized> {
    permissions: &'a P,
    roles: &'a C,
}

impl<'a, P, C> GrantAuthorizer<'a, P, C>
where
    P: PermissionChecker + ?Sized,
    C: RoleCatalog + ?Sized,
{
    /// Creates an authorizer backed by the host's permission checker and
    /// role catalog.
    pub fn new(permissions: &'a P, roles: &'a C) -> Self {
        Self { permissions, roles }
    }

    /// Checks every rule and returns a [`GrantCap`] if all pass.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthorized`] naming the first rule that failed.
    pub fn authorize(
        &self,
        actor: &RoleRecord,
        mutation: &Mutation,
        target: &RoleRecord,
        is_create_role_statement: bool,
    ) -> Result<GrantCap, AuthError> {
        if let Err(reason) = self.validate_all(actor, mutation, target, is_create_role_statement) {
            tracing::debug!(
                target: "audit_whitelist",
                actor = %actor.name,
                grantee = %target.name,
                resource = %mutation.resource,
                %reason,
                "whitelist mutation denied"
            );
            return Err(AuthError::Unauthorized {
                role: actor.name.clone(),
                reason,
            });
        }
        Ok(GrantCap::new())
    }

    fn validate_all(
        &self,
        actor: &RoleRecord,
        mutation: &Mutation,
        target: &RoleRecord,
        is_create_role_statement: bool,
    ) -> Result<(), DenialReason> {
        if is_create_role_statement {
            return Err(DenialReason::CreateRoleStatement);
        }
        if self.permissions.is_superuser(&actor.name) {
            return Ok(());
        }
        if !self.holds_authorize(&actor.name, &mutation.resource) {
            return Err(DenialReason::MissingAuthorize {
                resource: mutation.resource.clone(),
            });
        }
        if self.inherits_from(actor, &target.name) {
            return Err(DenialReason::SelfWhitelist);
        }
        Ok(())
    }

    /// True if the actor is `target` or holds it through role grants.
    fn inherits_from(&self, actor: &RoleRecord, target: &str) -> bool {
        actor.name == target
            || actor.granted_roles.contains(target)
            || ExemptionEvaluator::new(self.roles).inherits(&actor.granted_roles, target)
    }

    /// AUTHORIZE on any ancestor covers the resource.
    fn holds_authorize(&self, role: &str, resource: &Resource) -> bool {
        resource
            .ancestors()
            .iter()
            .any(|r| self.permissions.has_authorize(role, r))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use super::*;
    use crate::catalog::PermissionTable;
    use crate::option::parse_option;

    type Roles = HashMap<String, Arc<RoleRecord>>;

    fn grant_all(spec: &str) -> Mutation {
        parse_option("grant_audit_whitelist_for_all", spec).unwrap()
    }

    fn permissions() -> PermissionTable {
        PermissionTable::new()
            .with_superuser("super_user")
            .with_authorize("authorized_user", Resource::root_data())
            .with_authorize("ks_admin", Resource::keyspace("ecks"))
    }

    fn roles(records: Vec<RoleRecord>) -> Roles {
        records
            .into_iter()
            .map(|r| (r.name.clone(), Arc::new(r)))
            .collect()
    }

    fn reason(result: Result<GrantCap, AuthError>) -> DenialReason {
        result.unwrap_err().reason().clone()
    }

    #[test]
    fn create_statement_is_always_denied() {
        let (perms, roles) = (permissions(), Roles::new());
        let authorizer = GrantAuthorizer::new(&perms, &roles);
        let target = RoleRecord::new("temporary_user");

        for actor in ["super_user", "authorized_user"] {
            let actor = RoleRecord::new(actor);
            let result = authorizer.authorize(&actor, &grant_all("data"), &target, true);
            assert_eq!(reason(result), DenialReason::CreateRoleStatement);
        }
    }

    #[test]
    fn superuser_may_whitelist_anyone_including_itself() {
        let (perms, roles) = (permissions(), Roles::new());
        let authorizer = GrantAuthorizer::new(&perms, &roles);
        let actor = RoleRecord::new("super_user");
        let other = RoleRecord::new("other_user");

        assert!(authorizer
            .authorize(&actor, &grant_all("connections"), &other, false)
            .is_ok());
        assert!(authorizer
            .authorize(&actor, &grant_all("data"), &actor, false)
            .is_ok());
    }

    #[test]
    fn authorize_on_ancestor_covers_descendants() {
        let (perms, roles) = (permissions(), Roles::new());
        let authorizer = GrantAuthorizer::new(&perms, &roles);
        let target = RoleRecord::new("other_user");
        let table = grant_all("data/ecks/ectbl");

        let actor = RoleRecord::new("authorized_user");
        assert!(authorizer.authorize(&actor, &table, &target, false).is_ok());

        let actor = RoleRecord::new("ks_admin");
        assert!(authorizer.authorize(&actor, &table, &target, false).is_ok());
        assert_eq!(
            reason(authorizer.authorize(&actor, &grant_all("data"), &target, false)),
            DenialReason::MissingAuthorize {
                resource: Resource::root_data()
            }
        );
    }

    #[test]
    fn missing_authorize_is_denied() {
        let (perms, roles) = (permissions(), Roles::new());
        let authorizer = GrantAuthorizer::new(&perms, &roles);
        let actor = RoleRecord::new("create_user");
        let target = RoleRecord::new("temporary_user");

        let result = authorizer.authorize(&actor, &grant_all("data"), &target, false);
        assert!(matches!(reason(result), DenialReason::MissingAuthorize { .. }));
    }

    #[test]
    fn self_whitelisting_is_denied_despite_authorize() {
        let (perms, roles) = (permissions(), Roles::new());
        let authorizer = GrantAuthorizer::new(&perms, &roles);
        let actor = RoleRecord::new("authorized_user");

        let result = authorizer.authorize(&actor, &grant_all("data"), &actor, false);
        assert_eq!(reason(result), DenialReason::SelfWhitelist);
    }

    #[test]
    fn whitelisting_a_directly_granted_role_is_denied() {
        let (perms, roles) = (permissions(), Roles::new());
        let authorizer = GrantAuthorizer::new(&perms, &roles);
        let actor = RoleRecord::new("authorized_user").with_granted_role("helper");
        let helper = RoleRecord::new("helper");

        let result = authorizer.authorize(&actor, &grant_all("data"), &helper, false);
        assert_eq!(reason(result), DenialReason::SelfWhitelist);
    }

    #[test]
    fn whitelisting_a_transitively_granted_role_is_denied() {
        let perms = permissions();
        let roles = roles(vec![
            RoleRecord::new("helper").with_granted_role("base"),
            RoleRecord::new("base"),
        ]);
        let authorizer = GrantAuthorizer::new(&perms, &roles);
        let actor = RoleRecord::new("authorized_user").with_granted_role("helper");

        let base = RoleRecord::new("base");
        let result = authorizer.authorize(&actor, &grant_all("data"), &base, false);
        assert_eq!(reason(result), DenialReason::SelfWhitelist);

        let other = RoleRecord::new("other_user");
        assert!(authorizer
            .authorize(&actor, &grant_all("data"), &other, false)
            .is_ok());
    }

    #[test]
    fn revoke_follows_the_same_rules() {
        let (perms, roles) = (permissions(), Roles::new());
        let authorizer = GrantAuthorizer::new(&perms, &roles);
        let revoke = parse_option("revoke_audit_whitelist_for_select", "data").unwrap();
        let actor = RoleRecord::new("ordinary_user");

        assert!(authorizer.authorize(&actor, &revoke, &actor, false).is_err());
    }

    #[test]
    fn grant_cap_is_zero_sized() {
        assert_eq!(std::mem::size_of::<GrantCap>(), 0);
    }
}
