//! Domain model for derived query compilation.
//!
//! # Responsibility
//! - Describe mapped entity metadata the parser resolves names against.
//! - Define the predicate and identifier values passed between stages.
//!
//! # Invariants
//! - Model values are immutable once a query has been compiled.
//! - Mapping metadata is read-only for the lifetime of a compiler.

pub mod identifier;
pub mod mapping;
pub mod predicate;
