//! Auditable operation categories.
//!
//! Every audited statement falls into one [`Operation`]. Which operations
//! make sense depends on the kind of resource they act on, so the set of
//! operations that may be whitelisted is always narrowed with
//! [`OperationSet::legal_for`].

use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;
use crate::resource::ResourceKind;

/// A category of auditable operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    /// Create a keyspace, table or role
    Create,
    /// Alter a keyspace, table or role
    Alter,
    /// Drop a keyspace, table or role
    Drop,
    /// Read data
    Select,
    /// Write or delete data
    Modify,
    /// Grant or revoke permissions
    Authorize,
    /// List roles
    Describe,
    /// Execute on a connection (login)
    Execute,
}

impl Operation {
    /// All operations, in declaration order.
    pub const ALL: [Operation; 8] = [
        Operation::Create,
        Operation::Alter,
        Operation::Drop,
        Operation::Select,
        Operation::Modify,
        Operation::Authorize,
        Operation::Describe,
        Operation::Execute,
    ];

    /// Returns the upper-case name used in role options.
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Create => "CREATE",
            Operation::Alter => "ALTER",
            Operation::Drop => "DROP",
            Operation::Select => "SELECT",
            Operation::Modify => "MODIFY",
            Operation::Authorize => "AUTHORIZE",
            Operation::Describe => "DESCRIBE",
            Operation::Execute => "EXECUTE",
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = ParseError;

    /// Parses an operation name, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseError::UnknownOperation(s.to_string()))
    }
}

/// A set of operations, stored as a bit mask.
///
/// The set is `Copy`, so whitelist entries can be read and combined
/// without allocation on the audit path.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct OperationSet(u8);

impl OperationSet {
    /// The empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every operation, regardless of resource kind.
    pub fn all() -> Self {
        Operation::ALL.into_iter().collect()
    }

    /// Operations that can be audited (and whitelisted) on a resource kind.
    ///
    /// | kind | operations |
    /// |---|---|
    /// | Data | CREATE, ALTER, DROP, SELECT, MODIFY, AUTHORIZE |
    /// | Role | CREATE, ALTER, DROP, AUTHORIZE, DESCRIBE |
    /// | Connection | AUTHORIZE, EXECUTE |
    pub fn legal_for(kind: ResourceKind) -> Self {
        use Operation::*;
        let ops: &[Operation] = match kind {
            ResourceKind::Data => &[Create, Alter, Drop, Select, Modify, Authorize],
            ResourceKind::Role => &[Create, Alter, Drop, Authorize, Describe],
            ResourceKind::Connection => &[Authorize, Execute],
        };
        ops.iter().copied().collect()
    }

    /// Returns a set holding a single operation.
    pub fn single(op: Operation) -> Self {
        Self(op.bit())
    }

    /// Returns true if `op` is in the set.
    pub fn contains(self, op: Operation) -> bool {
        self.0 & op.bit() != 0
    }

    /// Adds `op` to the set.
    pub fn insert(&mut self, op: Operation) {
        self.0 |= op.bit();
    }

    /// Returns the union of both sets.
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns the operations in both sets.
    pub fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Returns the operations of `self` that are not in `other`.
    pub fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Returns true if the set holds no operation.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns the number of operations in the set.
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates the operations in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Operation> {
        Operation::ALL.into_iter().filter(move |op| self.contains(*op))
    }
}

impl From<Operation> for OperationSet {
    fn from(op: Operation) -> Self {
        OperationSet::single(op)
    }
}

impl FromIterator<Operation> for OperationSet {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        let mut set = OperationSet::empty();
        for op in iter {
            set.insert(op);
        }
        set
    }
}

impl fmt::Debug for OperationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for OperationSet {
    /// Comma-separated operation names, e.g. `SELECT,MODIFY`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, op) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(op.as_str())?;
        }
        Ok(())
    }
}

/// The operation part of a whitelist option key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationSpec {
    /// `_for_all`: every operation legal on the resource
    All,
    /// `_for_<op>`: one named operation
    Single(Operation),
}

impl OperationSpec {
    /// Parses the suffix of a whitelist option key, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnknownOperation`] for anything other than an
    /// operation name or `all`.
    pub fn parse_suffix(token: &str) -> Result<Self, ParseError> {
        if token.eq_ignore_ascii_case("all") {
            return Ok(OperationSpec::All);
        }
        token.parse().map(OperationSpec::Single)
    }

    /// Resolves the spec against a resource kind.
    ///
    /// `All` narrows to the legal set silently. A named operation that is
    /// not legal on the kind is rejected rather than producing an empty grant.
    pub fn resolve(self, kind: ResourceKind, resource: &str) -> Result<OperationSet, ParseError> {
        let legal = OperationSet::legal_for(kind);
        match self {
            OperationSpec::All => Ok(legal),
            OperationSpec::Single(op) if legal.contains(op) => Ok(OperationSet::single(op)),
            OperationSpec::Single(op) => Err(ParseError::IllegalOperation {
                operation: op.to_string(),
                resource: resource.to_string(),
            }),
        }
    }
}
