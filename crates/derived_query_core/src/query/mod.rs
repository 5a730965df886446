//! Method-name to query compilation pipeline.
//!
//! # Responsibility
//! - Turn a repository method name into a validated `CompiledQuery`.
//! - Register compiled queries and run them through a statement executor.
//!
//! # Invariants
//! - Stages run in a fixed order and the first violation wins.
//! - Nothing here writes to the database.
//!
//! # See also
//! - `model` for the values passed between stages.
//! - `sql` for statement generation and execution.

pub mod compiler;
pub mod error;
pub mod identifiers;
pub mod parser;
pub mod registry;
pub mod runner;
pub mod validate;
pub mod verb;
