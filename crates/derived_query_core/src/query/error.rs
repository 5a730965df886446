//! Compile-time violations raised while deriving a query from a method name.
//!
//! # Invariants
//! - Every violation is a developer-facing configuration error; none is
//!   retryable.
//! - `CompileError` always names the method that failed.

use crate::model::predicate::Connector;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CompileResult<T> = Result<T, CompileError>;

/// One broken naming or aggregate rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryViolation {
    /// The name does not start with a lower-case verb keyword.
    MalformedMethodName(String),
    /// The declared root type is not part of the mapping context.
    UnknownRootType(String),
    /// A path chunk matches no property reachable from the root.
    UnresolvableProperty { chunk: String, root: String },
    /// A predicate's leaf property is owned by a type outside the aggregate.
    CrossAggregate {
        property: String,
        owning_type: String,
        root: String,
    },
    /// A predicate compares a whole child entity instead of a column.
    EntityValuedProperty(String),
    UnsupportedConnector(Connector),
    TooManyPredicates { count: usize, max: usize },
    EmptyQuery,
    UnsupportedModifyingQuery(String),
    /// The same property is referenced by two predicates.
    DuplicateProperty(String),
}

impl QueryViolation {
    /// Stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedMethodName(_) => "malformed_method_name",
            Self::UnknownRootType(_) => "unknown_root_type",
            Self::UnresolvableProperty { .. } => "unresolvable_property",
            Self::CrossAggregate { .. } => "cross_aggregate",
            Self::EntityValuedProperty(_) => "entity_valued_property",
            Self::UnsupportedConnector(_) => "unsupported_connector",
            Self::TooManyPredicates { .. } => "too_many_predicates",
            Self::EmptyQuery => "empty_query",
            Self::UnsupportedModifyingQuery(_) => "unsupported_modifying_query",
            Self::DuplicateProperty(_) => "duplicate_property",
        }
    }
}

impl Display for QueryViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedMethodName(reason) => write!(f, "malformed method name: {reason}"),
            Self::UnknownRootType(root) => write!(f, "aggregate root `{root}` is not mapped"),
            Self::UnresolvableProperty { chunk, root } => {
                write!(f, "no property `{chunk}` found on `{root}`")
            }
            Self::CrossAggregate {
                property,
                owning_type,
                root,
            } => write!(
                f,
                "property `{property}` is owned by `{owning_type}`, outside aggregate root `{root}`"
            ),
            Self::EntityValuedProperty(property) => write!(
                f,
                "property `{property}` references an entity; only column properties can be compared"
            ),
            Self::UnsupportedConnector(connector) => write!(
                f,
                "connector `{connector}` is not supported; only `And` may join predicates"
            ),
            Self::TooManyPredicates { count, max } => {
                write!(f, "{count} predicates found; at most {max} are supported")
            }
            Self::EmptyQuery => write!(f, "no property condition found after the verb"),
            Self::UnsupportedModifyingQuery(verb) => {
                write!(f, "verb `{verb}` is not a read-only query verb")
            }
            Self::DuplicateProperty(name) => {
                write!(f, "property `{name}` is referenced more than once")
            }
        }
    }
}

impl Error for QueryViolation {}

/// Violation bound to the method name it was raised for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub method: String,
    pub violation: QueryViolation,
}

impl CompileError {
    pub fn new(method: impl Into<String>, violation: QueryViolation) -> Self {
        Self {
            method: method.into(),
            violation,
        }
    }
}

impl Display for CompileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cannot derive query from `{}`: {}",
            self.method, self.violation
        )
    }
}

impl Error for CompileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.violation)
    }
}
