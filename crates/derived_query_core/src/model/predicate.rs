//! Predicate model produced by method-name parsing.
//!
//! # Invariants
//! - `Predicate::property_path` is never empty.
//! - A `PredicateSet` holds exactly `predicates.len() - 1` connectors, or none
//!   when it has zero or one predicate.

use crate::model::mapping::PropertyType;
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Keyword joining two predicates in a method name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Connector {
    /// Conjunction (`And`), the only supported connector.
    And,
    /// Alternation (`Or`).
    Or,
}

impl Connector {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::And => "And",
            Self::Or => "Or",
        }
    }

    pub fn from_keyword(value: &str) -> Option<Self> {
        match value {
            "And" => Some(Self::And),
            "Or" => Some(Self::Or),
            _ => None,
        }
    }
}

impl Display for Connector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Leading verb of a method name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verb {
    Find,
    Read,
    Get,
    Query,
    Stream,
    Count,
    Exists,
    /// Any other leading keyword, e.g. `delete` or `remove`.
    Other(String),
}

impl Verb {
    pub fn from_keyword(value: &str) -> Self {
        match value {
            "find" => Self::Find,
            "read" => Self::Read,
            "get" => Self::Get,
            "query" => Self::Query,
            "stream" => Self::Stream,
            "count" => Self::Count,
            "exists" => Self::Exists,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn keyword(&self) -> &str {
        match self {
            Self::Find => "find",
            Self::Read => "read",
            Self::Get => "get",
            Self::Query => "query",
            Self::Stream => "stream",
            Self::Count => "count",
            Self::Exists => "exists",
            Self::Other(value) => value.as_str(),
        }
    }
}

impl Display for Verb {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One equality condition derived from a method name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Predicate {
    property_path: Vec<String>,
    leaf_type: PropertyType,
    owning_type: String,
}

impl Predicate {
    /// Creates a predicate; returns `None` for an empty path.
    pub fn new(
        property_path: Vec<String>,
        leaf_type: PropertyType,
        owning_type: impl Into<String>,
    ) -> Option<Self> {
        if property_path.is_empty() {
            return None;
        }
        Some(Self {
            property_path,
            leaf_type,
            owning_type: owning_type.into(),
        })
    }

    pub fn property_path(&self) -> &[String] {
        &self.property_path
    }

    /// First path segment; names the root-level property the predicate uses.
    pub fn segment(&self) -> &str {
        self.property_path[0].as_str()
    }

    /// Last path segment.
    pub fn leaf_name(&self) -> &str {
        self.property_path[self.property_path.len() - 1].as_str()
    }

    pub fn leaf_type(&self) -> &PropertyType {
        &self.leaf_type
    }

    pub fn owning_type(&self) -> &str {
        self.owning_type.as_str()
    }

    /// Dotted form of the path, e.g. `animal.nickName`.
    pub fn dotted_path(&self) -> String {
        self.property_path.join(".")
    }
}

/// Ordered predicates parsed from one method name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredicateSet {
    verb: Verb,
    subject: Option<String>,
    predicates: Vec<Predicate>,
    connectors: Vec<Connector>,
}

impl PredicateSet {
    pub(crate) fn new(
        verb: Verb,
        subject: Option<String>,
        predicates: Vec<Predicate>,
        connectors: Vec<Connector>,
    ) -> Self {
        debug_assert!(
            connectors.len() + 1 == predicates.len() || (predicates.is_empty() && connectors.is_empty())
        );
        Self {
            verb,
            subject,
            predicates,
            connectors,
        }
    }

    pub fn verb(&self) -> &Verb {
        &self.verb
    }

    /// Ignored returned-type qualifier between verb and `By`, e.g. `Distinct`.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// Connectors in declaration order, one between each predicate pair.
    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    /// The connector shared by all predicates; `None` for zero or one predicate.
    pub fn connector(&self) -> Option<Connector> {
        self.connectors.first().copied()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}
