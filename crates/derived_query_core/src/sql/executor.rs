//! Statement execution collaborator contracts and SQLite implementation.
//!
//! # Responsibility
//! - Bind named parameter values and execute compiled SQL.
//! - Hand each result row to a caller-supplied `RowMapper`.
//!
//! # Invariants
//! - Executors never rewrite SQL text; they only bind and run it.
//! - Row materialization is owned by the mapper, not the executor.

use log::debug;
use rusqlite::types::{ToSql, Value};
use rusqlite::{Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ExecResult<T> = Result<T, ExecError>;

/// One named parameter (without the leading `:`) and its bound value.
pub type NamedValue = (String, Value);

/// Runtime error raised while invoking a compiled query.
#[derive(Debug)]
pub enum ExecError {
    /// Caller supplied a different number of arguments than the method declares.
    ArgumentCountMismatch {
        method: String,
        expected: usize,
        actual: usize,
    },
    /// A single-result method matched more than one row.
    NonUniqueResult { method: String, count: usize },
    Db(rusqlite::Error),
}

impl Display for ExecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ArgumentCountMismatch {
                method,
                expected,
                actual,
            } => write!(
                f,
                "`{method}` expects {expected} argument(s) but {actual} were supplied"
            ),
            Self::NonUniqueResult { method, count } => {
                write!(f, "`{method}` expected at most one row but found {count}")
            }
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ExecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::ArgumentCountMismatch { .. } | Self::NonUniqueResult { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for ExecError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(value)
    }
}

/// Maps one result row into a domain value.
pub trait RowMapper<T> {
    fn map_row(&self, row: &Row<'_>) -> rusqlite::Result<T>;
}

impl<T, F> RowMapper<T> for F
where
    F: Fn(&Row<'_>) -> rusqlite::Result<T>,
{
    fn map_row(&self, row: &Row<'_>) -> rusqlite::Result<T> {
        self(row)
    }
}

/// Executes SQL text with named parameters.
pub trait StatementExecutor {
    fn query_rows<T, M>(&self, sql: &str, params: &[NamedValue], mapper: &M) -> ExecResult<Vec<T>>
    where
        M: RowMapper<T>;

    fn query_count(&self, sql: &str, params: &[NamedValue]) -> ExecResult<i64>;
}

/// SQLite-backed statement executor.
pub struct SqliteStatementExecutor<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStatementExecutor<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl StatementExecutor for SqliteStatementExecutor<'_> {
    fn query_rows<T, M>(&self, sql: &str, params: &[NamedValue], mapper: &M) -> ExecResult<Vec<T>>
    where
        M: RowMapper<T>,
    {
        let names = sql_parameter_names(params);
        let bound = bind_named(&names, params);
        let mut stmt = self.conn.prepare_cached(sql)?;
        let mut rows = stmt.query(bound.as_slice())?;
        let mut mapped = Vec::new();

        while let Some(row) = rows.next()? {
            mapped.push(mapper.map_row(row)?);
        }

        debug!(
            "event=query_execute module=sql status=ok kind=rows params={} rows={}",
            params.len(),
            mapped.len()
        );
        Ok(mapped)
    }

    fn query_count(&self, sql: &str, params: &[NamedValue]) -> ExecResult<i64> {
        let names = sql_parameter_names(params);
        let bound = bind_named(&names, params);
        let mut stmt = self.conn.prepare_cached(sql)?;
        let count = stmt.query_row(bound.as_slice(), |row| row.get::<_, i64>(0))?;

        debug!(
            "event=query_execute module=sql status=ok kind=count params={}",
            params.len()
        );
        Ok(count)
    }
}

fn sql_parameter_names(params: &[NamedValue]) -> Vec<String> {
    params.iter().map(|(name, _)| format!(":{name}")).collect()
}

fn bind_named<'a>(names: &'a [String], params: &'a [NamedValue]) -> Vec<(&'a str, &'a dyn ToSql)> {
    names
        .iter()
        .zip(params)
        .map(|(name, (_, value))| (name.as_str(), value as &dyn ToSql))
        .collect()
}
