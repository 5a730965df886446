//! Derived-query compiler entry point.
//!
//! # Responsibility
//! - Run tokenize, verb, resolve, validate and identifier stages in order.
//! - Ask the SQL generator for the count or find statement.
//! - Produce an immutable `CompiledQuery` reused by every invocation.
//!
//! # Invariants
//! - Any violation fails compilation immediately; there is no partial result.
//! - Compiling the same method twice yields identical SQL and bindings.
//!
//! # See also
//! - `query::validate` for the stage order of the predicate checks.

use crate::model::identifier::{IdentifierSet, Placeholder};
use crate::model::mapping::MappingContext;
use crate::model::predicate::{PredicateSet, Verb};
use crate::query::error::{CompileError, CompileResult, QueryViolation};
use crate::query::identifiers::build_identifiers;
use crate::query::parser::{resolve, tokenize};
use crate::query::validate::validate_predicates;
use crate::query::verb::classify;
use crate::sql::executor::{ExecError, ExecResult, NamedValue};
use crate::sql::generator::EntitySqlGenerator;
use log::{info, warn};
use rusqlite::types::Value;
use std::time::Instant;

/// Positional argument bound to one SQL placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub position: usize,
    pub placeholder: Placeholder,
}

/// SQL text plus binding plan for one repository method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    method: String,
    root: String,
    predicates: PredicateSet,
    identifiers: IdentifierSet,
    sql: String,
    bindings: Vec<Binding>,
}

impl CompiledQuery {
    pub fn method(&self) -> &str {
        self.method.as_str()
    }

    pub fn root(&self) -> &str {
        self.root.as_str()
    }

    pub fn verb(&self) -> &Verb {
        self.predicates.verb()
    }

    pub fn predicates(&self) -> &PredicateSet {
        &self.predicates
    }

    pub fn identifiers(&self) -> &IdentifierSet {
        &self.identifiers
    }

    pub fn sql(&self) -> &str {
        self.sql.as_str()
    }

    /// Placeholders referenced by the SQL text, in argument order.
    ///
    /// Empty for count statements, which do not filter.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Number of arguments the repository method declares.
    pub fn arity(&self) -> usize {
        self.identifiers.len()
    }

    /// Pairs positional `args` with placeholder names.
    pub fn bind(&self, args: &[Value]) -> ExecResult<Vec<NamedValue>> {
        if args.len() != self.arity() {
            return Err(ExecError::ArgumentCountMismatch {
                method: self.method.clone(),
                expected: self.arity(),
                actual: args.len(),
            });
        }

        Ok(self
            .bindings
            .iter()
            .map(|binding| {
                (
                    binding.placeholder.name().to_string(),
                    args[binding.position].clone(),
                )
            })
            .collect())
    }
}

/// Compiles method names against one mapping context and SQL generator.
pub struct DerivedQueryCompiler<'ctx, G> {
    mapping: &'ctx MappingContext,
    generator: G,
}

impl<'ctx, G: EntitySqlGenerator> DerivedQueryCompiler<'ctx, G> {
    pub fn new(mapping: &'ctx MappingContext, generator: G) -> Self {
        Self { mapping, generator }
    }

    pub fn mapping(&self) -> &'ctx MappingContext {
        self.mapping
    }

    /// Compiles `method` for aggregate root `root`.
    ///
    /// # Errors
    /// - Returns the first broken rule, bound to the method name.
    ///
    /// # Side effects
    /// - Emits one `query_compile` log event with status and duration.
    pub fn compile(&self, root: &str, method: &str) -> CompileResult<CompiledQuery> {
        let started_at = Instant::now();

        match self.compile_stages(root, method) {
            Ok(compiled) => {
                info!(
                    "event=query_compile module=query status=ok method={} root={} predicates={} duration_us={}",
                    method,
                    root,
                    compiled.predicates.len(),
                    started_at.elapsed().as_micros()
                );
                Ok(compiled)
            }
            Err(violation) => {
                warn!(
                    "event=query_compile module=query status=error method={} root={} error_code={} duration_us={}",
                    method,
                    root,
                    violation.code(),
                    started_at.elapsed().as_micros()
                );
                Err(CompileError::new(method, violation))
            }
        }
    }

    fn compile_stages(&self, root: &str, method: &str) -> Result<CompiledQuery, QueryViolation> {
        let tokens = tokenize(method)?;
        let verb = Verb::from_keyword(&tokens.verb);
        classify(&verb)?;

        let predicates = resolve(&tokens, self.mapping, root)?;
        validate_predicates(&predicates, self.mapping, root)?;
        let identifiers = build_identifiers(&predicates)?;

        let (sql, bindings) = if predicates.verb() == &Verb::Count {
            (self.generator.count_statement(root)?, Vec::new())
        } else {
            let sql = self.generator.find_all_by_property(root, &identifiers)?;
            let bindings = identifiers
                .iter()
                .enumerate()
                .map(|(position, identifier)| Binding {
                    position,
                    placeholder: identifier.placeholder().clone(),
                })
                .collect();
            (sql, bindings)
        };

        Ok(CompiledQuery {
            method: method.to_string(),
            root: root.to_string(),
            predicates,
            identifiers,
            sql,
            bindings,
        })
    }
}
