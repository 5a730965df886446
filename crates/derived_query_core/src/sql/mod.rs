//! SQL generation and statement execution.

pub mod executor;
pub mod generator;
