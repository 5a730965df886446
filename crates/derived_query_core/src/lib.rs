//! Derived-query compiler core.
//! Turns repository method names into read-only SQL bound to a mapped aggregate.

pub mod logging;
pub mod model;
pub mod query;
pub mod sql;

pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig, LoggingError};
pub use model::identifier::{Identifier, IdentifierSet, Placeholder};
pub use model::mapping::{
    EntityType, MappingContext, MappingError, PropertyMeta, PropertyType, ScalarType,
};
pub use model::predicate::{Connector, Predicate, PredicateSet, Verb};
pub use query::compiler::{Binding, CompiledQuery, DerivedQueryCompiler};
pub use query::error::{CompileError, CompileResult, QueryViolation};
pub use query::registry::{DerivedQueryRegistry, RegistryError};
pub use query::runner::{DerivedQuery, QueryMethod, QueryOutcome, ResultShape};
pub use sql::executor::{
    ExecError, ExecResult, NamedValue, RowMapper, SqliteStatementExecutor, StatementExecutor,
};
pub use sql::generator::{DefaultSqlGenerator, EntitySqlGenerator};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
