//! Executable derived queries.
//!
//! # Responsibility
//! - Pair a `CompiledQuery` with the declared result shape of its method.
//! - Bind call arguments and shape executor output into a `QueryOutcome`.
//!
//! # Invariants
//! - A `DerivedQuery` is immutable and may be shared across threads.
//! - Each call binds fresh argument values; nothing is cached per call.

use crate::model::predicate::Verb;
use crate::query::compiler::CompiledQuery;
use crate::sql::executor::{ExecError, ExecResult, RowMapper, StatementExecutor};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// Declared return shape of a repository method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultShape {
    /// Zero or one entity (`Option<T>`).
    Single,
    /// Any number of entities (`Vec<T>`).
    Collection,
}

/// Repository method declaration handed to registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryMethod {
    pub name: String,
    /// Aggregate root the repository addresses.
    pub domain_type: String,
    pub result_shape: ResultShape,
}

impl QueryMethod {
    pub fn new(
        name: impl Into<String>,
        domain_type: impl Into<String>,
        result_shape: ResultShape,
    ) -> Self {
        Self {
            name: name.into(),
            domain_type: domain_type.into(),
            result_shape,
        }
    }

    pub fn collection(name: impl Into<String>, domain_type: impl Into<String>) -> Self {
        Self::new(name, domain_type, ResultShape::Collection)
    }

    pub fn single(name: impl Into<String>, domain_type: impl Into<String>) -> Self {
        Self::new(name, domain_type, ResultShape::Single)
    }
}

/// Result of one derived-query invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome<T> {
    Count(i64),
    Exists(bool),
    /// `None` when no row matched.
    Single(Option<T>),
    Collection(Vec<T>),
}

impl<T> QueryOutcome<T> {
    /// Flattens entity outcomes into a list; count/exists yield an empty list.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Single(value) => value.into_iter().collect(),
            Self::Collection(values) => values,
            Self::Count(_) | Self::Exists(_) => Vec::new(),
        }
    }
}

/// Compiled query bound to its method's result shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedQuery {
    compiled: CompiledQuery,
    result_shape: ResultShape,
}

impl DerivedQuery {
    pub fn new(compiled: CompiledQuery, result_shape: ResultShape) -> Self {
        Self {
            compiled,
            result_shape,
        }
    }

    pub fn compiled(&self) -> &CompiledQuery {
        &self.compiled
    }

    pub fn sql(&self) -> &str {
        self.compiled.sql()
    }

    pub fn result_shape(&self) -> ResultShape {
        self.result_shape
    }

    /// Runs the query with positional `args`.
    ///
    /// # Errors
    /// - `ArgumentCountMismatch` when `args` does not match the method arity.
    /// - `NonUniqueResult` when a single-result method matches several rows.
    /// - `Db` for executor failures.
    pub fn execute<T, E, M>(
        &self,
        executor: &E,
        args: &[Value],
        mapper: &M,
    ) -> ExecResult<QueryOutcome<T>>
    where
        E: StatementExecutor,
        M: RowMapper<T>,
    {
        let params = self.compiled.bind(args)?;
        let sql = self.compiled.sql();

        match self.compiled.verb() {
            Verb::Count => Ok(QueryOutcome::Count(executor.query_count(sql, &params)?)),
            Verb::Exists => {
                let presence = |_: &Row<'_>| -> rusqlite::Result<()> { Ok(()) };
                let rows = executor.query_rows(sql, &params, &presence)?;
                Ok(QueryOutcome::Exists(!rows.is_empty()))
            }
            _ => {
                let mut rows = executor.query_rows(sql, &params, mapper)?;
                match self.result_shape {
                    ResultShape::Collection => Ok(QueryOutcome::Collection(rows)),
                    ResultShape::Single if rows.len() > 1 => Err(ExecError::NonUniqueResult {
                        method: self.compiled.method().to_string(),
                        count: rows.len(),
                    }),
                    ResultShape::Single => Ok(QueryOutcome::Single(rows.pop())),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{QueryMethod, QueryOutcome, ResultShape};

    #[test]
    fn into_vec_flattens_entity_outcomes() {
        assert_eq!(QueryOutcome::Single(Some(7)).into_vec(), vec![7]);
        assert!(QueryOutcome::<i32>::Single(None).into_vec().is_empty());
        assert_eq!(QueryOutcome::Collection(vec![1, 2]).into_vec(), vec![1, 2]);
        assert!(QueryOutcome::<i32>::Count(4).into_vec().is_empty());
    }

    #[test]
    fn query_method_deserializes_snake_case_shape() {
        let method: QueryMethod = serde_json::from_str(
            r#"{ "name": "findByFirstName", "domain_type": "Person", "result_shape": "single" }"#,
        )
        .expect("valid method json");
        assert_eq!(method, QueryMethod::single("findByFirstName", "Person"));
        assert_eq!(method.result_shape, ResultShape::Single);
    }
}
