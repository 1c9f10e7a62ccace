//! Role-based audit whitelists.
//!
//! A database audit layer logs every operation. Roles can be exempted
//! from logging for specific resources and operations through a per-role
//! whitelist, managed with role options:
//!
//! ```text
//! ALTER ROLE etl WITH OPTIONS = { 'grant_audit_whitelist_for_select' : 'data/ecks' }
//! ALTER ROLE etl WITH OPTIONS = { 'revoke_audit_whitelist_for_select' : 'data/ecks' }
//! ```
//!
//! This crate is the engine behind that feature:
//!
//! - [`Resource`]: the `data` / `roles` / `connections` hierarchy
//! - [`Operation`], [`OperationSet`]: auditable operations and which apply where
//! - [`parse_option`], [`parse_options`]: role options to a [`Mutation`]
//! - [`GrantAuthorizer`]: who may change whose whitelist
//! - [`Whitelist`], [`store::apply`]: per-role entries
//! - [`ExemptionEvaluator`]: should this event be logged?
//!
//! The host supplies schema, roles and permissions through the traits in
//! [`catalog`].
//!
//! # Examples
//!
//! ```
//! use std::collections::BTreeMap;
//! use audit_whitelist::{
//!     ExemptionEvaluator, Operation, PermissionTable, Resource, RoleDirectory, RoleRecord,
//!     SchemaSnapshot,
//! };
//!
//! let directory = RoleDirectory::new();
//! directory.upsert(RoleRecord::new("super_user"));
//! directory.upsert(RoleRecord::new("etl"));
//!
//! let schema = SchemaSnapshot::new().with_table("ecks", "ectbl");
//! let perms = PermissionTable::new().with_superuser("super_user");
//!
//! let options = BTreeMap::from([(
//!     "grant_audit_whitelist_for_select".to_string(),
//!     "data/ecks".to_string(),
//! )]);
//! directory.alter_role("super_user", "etl", &options, &schema, &perms)?;
//!
//! let evaluator = ExemptionEvaluator::new(&directory);
//! let table = Resource::table("ecks", "ectbl");
//! assert!(evaluator.is_exempt(["etl"], Operation::Select, &table));
//! assert!(!evaluator.is_exempt(["etl"], Operation::Modify, &table));
//! # Ok::<(), audit_whitelist::Error>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod authorizer;
pub mod catalog;
pub mod codec;
pub mod config;
mod directory;
mod error;
mod evaluator;
mod filter;
mod logging;
mod operation;
mod option;
mod resource;
mod role;
pub mod store;

#[cfg(test)]
mod test_utils;

pub use authorizer::{DenialReason, GrantAuthorizer, GrantCap};
pub use catalog::{PermissionChecker, PermissionTable, RoleCatalog, SchemaCatalog, SchemaSnapshot};
pub use config::{AuditConfig, FilterType, LoggerBackend};
pub use directory::RoleDirectory;
pub use error::{AuthError, ConfigError, Error, ParseError, ResourceError};
pub use evaluator::ExemptionEvaluator;
pub use filter::AuditFilter;
pub use logging::StatementLog;
pub use operation::{Operation, OperationSet, OperationSpec};
pub use option::{is_whitelist_option, parse_option, parse_options, Mutation, MutationKind};
pub use resource::{DataResource, Resource, ResourceKind};
pub use role::RoleRecord;
pub use store::Whitelist;
