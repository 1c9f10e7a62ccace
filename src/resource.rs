//! The hierarchy of auditable resources.
//!
//! Resources form three independent trees:
//!
//! ```text
//! data ── data/<ks> ── data/<ks>/<tbl>
//! roles ── roles/<name>
//! connections
//! ```
//!
//! A whitelist entry on a node covers every node below it, so matching an
//! event against the whitelist walks [`Resource::ancestors`].

use std::fmt;
use std::str::FromStr;

use crate::catalog::SchemaCatalog;
use crate::error::ResourceError;

const DATA_ROOT: &str = "data";
const ROLES_ROOT: &str = "roles";
const CONNECTIONS_ROOT: &str = "connections";

/// The root kind of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Keyspaces and tables
    Data,
    /// Roles
    Role,
    /// Client connections
    Connection,
}

/// A node in the data tree.
///
/// A table is always qualified by its keyspace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataResource {
    /// All keyspaces
    Root,
    /// One keyspace
    Keyspace(String),
    /// One table: keyspace, table
    Table(String, String),
}

/// An auditable resource.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Resource {
    /// A node in the data tree
    Data(DataResource),
    /// All roles (`None`) or one named role
    Role(Option<String>),
    /// All connections; never qualified
    Connection,
}

impl Resource {
    /// The `data` root.
    pub fn root_data() -> Self {
        Resource::Data(DataResource::Root)
    }

    /// `data/<keyspace>`
    pub fn keyspace(keyspace: impl Into<String>) -> Self {
        Resource::Data(DataResource::Keyspace(keyspace.into()))
    }

    /// `data/<keyspace>/<table>`
    pub fn table(keyspace: impl Into<String>, table: impl Into<String>) -> Self {
        Resource::Data(DataResource::Table(keyspace.into(), table.into()))
    }

    /// The `roles` root.
    pub fn root_roles() -> Self {
        Resource::Role(None)
    }

    /// `roles/<name>`
    pub fn role(name: impl Into<String>) -> Self {
        Resource::Role(Some(name.into()))
    }

    /// Parses a resource spec such as `data/ks/tbl`.
    ///
    /// Segments are separated by `/` and restricted to ASCII letters,
    /// digits and underscore. Whether the named object exists is not
    /// checked here; see [`Resource::exists`].
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError`] if the spec is malformed.
    ///
    /// # Examples
    ///
    /// ```
    /// use audit_whitelist::Resource;
    ///
    /// let table = Resource::parse("data/ecks/ectbl").unwrap();
    /// assert_eq!(table, Resource::table("ecks", "ectbl"));
    ///
    /// assert!(Resource::parse("connections/native").is_err());
    /// assert!(Resource::parse("roles/t%s").is_err());
    /// ```
    pub fn parse(spec: &str) -> Result<Self, ResourceError> {
        if spec.is_empty() {
            return Err(ResourceError::Empty);
        }

        let segments: Vec<&str> = spec.split('/').collect();
        let (root, rest) = segments.split_first().ok_or(ResourceError::Empty)?;

        let max = match *root {
            DATA_ROOT => 3,
            ROLES_ROOT => 2,
            CONNECTIONS_ROOT if rest.is_empty() => return Ok(Resource::Connection),
            CONNECTIONS_ROOT => return Err(ResourceError::QualifierNotAllowed(spec.to_string())),
            other => return Err(ResourceError::UnknownRoot(other.to_string())),
        };

        if segments.len() > max {
            return Err(ResourceError::TooManySegments {
                spec: spec.to_string(),
                max,
            });
        }

        for segment in rest {
            if !is_identifier(segment) {
                return Err(ResourceError::InvalidIdentifier {
                    spec: spec.to_string(),
                    segment: segment.to_string(),
                });
            }
        }

        let resource = match (*root, rest) {
            (DATA_ROOT, []) => Resource::root_data(),
            (DATA_ROOT, [ks]) => Resource::keyspace(*ks),
            (DATA_ROOT, [ks, tbl]) => Resource::table(*ks, *tbl),
            (_, []) => Resource::root_roles(),
            (_, [name]) => Resource::role(*name),
            _ => {
                return Err(ResourceError::TooManySegments {
                    spec: spec.to_string(),
                    max,
                })
            }
        };
        Ok(resource)
    }

    /// Returns the root kind of this resource.
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Data(_) => ResourceKind::Data,
            Resource::Role(_) => ResourceKind::Role,
            Resource::Connection => ResourceKind::Connection,
        }
    }

    /// Returns the parent resource, or `None` for a root.
    pub fn parent(&self) -> Option<Resource> {
        match self {
            Resource::Data(DataResource::Root) | Resource::Role(None) | Resource::Connection => {
                None
            }
            Resource::Data(DataResource::Keyspace(_)) => Some(Resource::root_data()),
            Resource::Data(DataResource::Table(ks, _)) => Some(Resource::keyspace(ks.clone())),
            Resource::Role(Some(_)) => Some(Resource::root_roles()),
        }
    }

    /// Returns the chain from the root down to this resource, inclusive.
    ///
    /// # Examples
    ///
    /// ```
    /// use audit_whitelist::Resource;
    ///
    /// let chain = Resource::table("ks", "tbl").ancestors();
    /// assert_eq!(
    ///     chain,
    ///     vec![Resource::root_data(), Resource::keyspace("ks"), Resource::table("ks", "tbl")]
    /// );
    /// ```
    pub fn ancestors(&self) -> Vec<Resource> {
        let mut chain = vec![self.clone()];
        let mut next = self.parent();
        while let Some(parent) = next {
            next = parent.parent();
            chain.push(parent);
        }
        chain.reverse();
        chain
    }

    /// Returns true if `self` is `other` or one of its ancestors.
    pub fn covers(&self, other: &Resource) -> bool {
        match (self, other) {
            (Resource::Data(DataResource::Root), Resource::Data(_)) => true,
            (
                Resource::Data(DataResource::Keyspace(a)),
                Resource::Data(DataResource::Keyspace(b) | DataResource::Table(b, _)),
            ) => a == b,
            (Resource::Role(None), Resource::Role(_)) => true,
            _ => self == other,
        }
    }

    /// Returns true if the object named by this resource currently exists.
    ///
    /// Roots always exist. A keyspace, table or role that does not exist
    /// yet is still a valid whitelist target.
    pub fn exists<C: SchemaCatalog + ?Sized>(&self, catalog: &C) -> bool {
        match self {
            Resource::Data(DataResource::Root) | Resource::Role(None) | Resource::Connection => {
                true
            }
            Resource::Data(DataResource::Keyspace(ks)) => catalog.keyspace_exists(ks),
            Resource::Data(DataResource::Table(ks, tbl)) => catalog.table_exists(ks, tbl),
            Resource::Role(Some(name)) => catalog.role_exists(name),
        }
    }
}

fn is_identifier(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Data(DataResource::Root) => write!(f, "{}", DATA_ROOT),
            Resource::Data(DataResource::Keyspace(ks)) => write!(f, "{}/{}", DATA_ROOT, ks),
            Resource::Data(DataResource::Table(ks, tbl)) => {
                write!(f, "{}/{}/{}", DATA_ROOT, ks, tbl)
            }
            Resource::Role(None) => write!(f, "{}", ROLES_ROOT),
            Resource::Role(Some(name)) => write!(f, "{}/{}", ROLES_ROOT, name),
            Resource::Connection => write!(f, "{}", CONNECTIONS_ROOT),
        }
    }
}

impl FromStr for Resource {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::parse(s)
    }
}
