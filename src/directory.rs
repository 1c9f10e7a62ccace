//! In-memory role directory with whitelist-aware role statements.
//!
//! This is the glue a host runs for `CREATE ROLE`, `ALTER ROLE`,
//! `GRANT <role>` and `DROP ROLE`: it sequences option parsing,
//! authorization and the store, and keeps the resulting records readable
//! by concurrent exemption checks.
//!
//! Records are immutable `Arc` snapshots. A mutation clones the record,
//! changes the clone and swaps it in under the write lock, so a reader
//! holding the old snapshot never sees half of a change.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::authorizer::{GrantAuthorizer, GrantCap};
use crate::catalog::{PermissionChecker, RoleCatalog, SchemaCatalog};
use crate::codec::{decode_whitelist, encode_whitelist};
use crate::error::{Error, ParseError};
use crate::logging::StatementLog;
use crate::option::{parse_options, Mutation, MutationKind};
use crate::role::RoleRecord;
use crate::store;

/// Concurrently readable set of role records.
#[derive(Debug, Default)]
pub struct RoleDirectory {
    roles: RwLock<HashMap<String, Arc<RoleRecord>>>,
}

impl RoleDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<RoleRecord>>> {
        self.roles.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<RoleRecord>>> {
        self.roles.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts or replaces a record as the host's role storage holds it.
    pub fn upsert(&self, record: RoleRecord) {
        self.write().insert(record.name.clone(), Arc::new(record));
    }

    /// Loads a role from its persisted form: granted roles plus role options.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if a persisted whitelist option is malformed.
    pub fn load<'a, I>(
        &self,
        name: &str,
        granted_roles: BTreeSet<String>,
        options: I,
    ) -> Result<(), ParseError>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let record = RoleRecord {
            name: name.to_string(),
            granted_roles,
            whitelist: decode_whitelist(options)?,
        };
        self.upsert(record);
        Ok(())
    }

    /// Returns the whitelist of a role rendered as role options.
    pub fn whitelist_options(&self, name: &str) -> Option<BTreeMap<String, String>> {
        self.lookup(name).map(|record| encode_whitelist(&record.whitelist))
    }

    /// Returns the names of all roles.
    pub fn role_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Handles `CREATE ROLE name WITH OPTIONS = {...}`.
    ///
    /// Whitelist options are rejected here regardless of the actor: a
    /// whitelist can only be changed on an existing role.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RoleExists`], a parse error for malformed whitelist
    /// options, or [`Error::Auth`] if any whitelist option is present.
    pub fn create_role<S, P>(
        &self,
        actor: &str,
        name: &str,
        options: &BTreeMap<String, String>,
        schema: &S,
        permissions: &P,
    ) -> Result<(), Error>
    where
        S: SchemaCatalog + ?Sized,
        P: PermissionChecker + ?Sized,
    {
        if self.lookup(name).is_some() {
            return Err(Error::RoleExists(name.to_string()));
        }

        let record = RoleRecord::new(name);
        if let Some(mutation) = parse_options(options, schema)? {
            let actor_record = self.actor_record(actor);
            let log = StatementLog::new(actor, name);
            let authorizer = GrantAuthorizer::new(permissions, self);
            if let Err(err) = authorizer.authorize(&actor_record, &mutation, &record, true) {
                log.warn(format_args!("{}", err));
                return Err(err.into());
            }
        }

        let mut roles = self.write();
        if roles.contains_key(name) {
            return Err(Error::RoleExists(name.to_string()));
        }
        roles.insert(name.to_string(), Arc::new(record));
        Ok(())
    }

    /// Handles `ALTER ROLE target WITH OPTIONS = {...}`.
    ///
    /// Returns the committed mutation, or `None` if the options held no
    /// whitelist key (the rest of the statement is the host's business).
    ///
    /// # Errors
    ///
    /// Returns a parse error, [`Error::UnknownRole`] for a missing target,
    /// or [`Error::Auth`] if the actor may not apply the mutation. Nothing
    /// is changed on error.
    pub fn alter_role<S, P>(
        &self,
        actor: &str,
        target: &str,
        options: &BTreeMap<String, String>,
        schema: &S,
        permissions: &P,
    ) -> Result<Option<Mutation>, Error>
    where
        S: SchemaCatalog + ?Sized,
        P: PermissionChecker + ?Sized,
    {
        let log = StatementLog::new(actor, target);
        let Some(mutation) = parse_options(options, schema)? else {
            log.debug(format_args!("no audit whitelist option"));
            return Ok(None);
        };
        let target_record = self
            .lookup(target)
            .ok_or_else(|| Error::UnknownRole(target.to_string()))?;
        let actor_record = self.actor_record(actor);

        let authorizer = GrantAuthorizer::new(permissions, self);
        let cap = match authorizer.authorize(&actor_record, &mutation, &target_record, false) {
            Ok(cap) => cap,
            Err(err) => {
                log.warn(format_args!("{}", err));
                return Err(err.into());
            }
        };

        self.commit(cap, target, &mutation)?;
        let verb = match mutation.kind {
            MutationKind::Grant => "granted",
            MutationKind::Revoke => "revoked",
        };
        log.info(format_args!(
            "{} audit whitelist {} on {}",
            verb, mutation.operations, mutation.resource
        ));
        Ok(Some(mutation))
    }

    /// Applies an authorized mutation to the stored record of `target`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownRole`] if the target was dropped meanwhile.
    pub fn commit(&self, _cap: GrantCap, target: &str, mutation: &Mutation) -> Result<(), Error> {
        let mut roles = self.write();
        let current = roles
            .get(target)
            .ok_or_else(|| Error::UnknownRole(target.to_string()))?;

        let mut updated = RoleRecord::clone(current);
        store::apply(&mut updated, mutation);
        roles.insert(target.to_string(), Arc::new(updated));
        Ok(())
    }

    /// Handles `GRANT role TO grantee`.
    ///
    /// Authorization of the grant itself is the host's concern. Cycles are
    /// not rejected; the evaluator tolerates them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownRole`] if either role is missing.
    pub fn grant_role(&self, role: &str, grantee: &str) -> Result<(), Error> {
        let mut roles = self.write();
        if !roles.contains_key(role) {
            return Err(Error::UnknownRole(role.to_string()));
        }
        let current = roles
            .get(grantee)
            .ok_or_else(|| Error::UnknownRole(grantee.to_string()))?;

        let mut updated = RoleRecord::clone(current);
        updated.granted_roles.insert(role.to_string());
        roles.insert(grantee.to_string(), Arc::new(updated));
        Ok(())
    }

    /// Handles `DROP ROLE name`, discarding its whitelist and memberships.
    ///
    /// Returns false if the role did not exist.
    pub fn drop_role(&self, name: &str) -> bool {
        let mut roles = self.write();
        if roles.remove(name).is_none() {
            return false;
        }
        for record in roles.values_mut() {
            if record.granted_roles.contains(name) {
                Arc::make_mut(record).granted_roles.remove(name);
            }
        }
        true
    }

    /// The actor as a record; an actor unknown to the directory (for
    /// example a superuser from another authenticator) has no grants.
    fn actor_record(&self, actor: &str) -> Arc<RoleRecord> {
        self.lookup(actor)
            .unwrap_or_else(|| Arc::new(RoleRecord::new(actor)))
    }
}

impl RoleCatalog for RoleDirectory {
    fn lookup(&self, name: &str) -> Option<Arc<RoleRecord>> {
        self.read().get(name).cloned()
    }
}
