//! Registration-time registry of derived queries.
//!
//! # Responsibility
//! - Compile each declared repository method exactly once.
//! - Keep one method's failure from affecting other registrations.
//!
//! # Invariants
//! - Method names are unique within one registry.
//! - Stored queries are never recompiled or mutated.

use crate::query::compiler::DerivedQueryCompiler;
use crate::query::error::CompileError;
use crate::query::runner::{DerivedQuery, QueryMethod};
use crate::sql::generator::EntitySqlGenerator;
use log::error;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// In-process registry keyed by method name.
pub struct DerivedQueryRegistry<'ctx, G> {
    compiler: DerivedQueryCompiler<'ctx, G>,
    entries: BTreeMap<String, DerivedQuery>,
}

impl<'ctx, G: EntitySqlGenerator> DerivedQueryRegistry<'ctx, G> {
    pub fn new(compiler: DerivedQueryCompiler<'ctx, G>) -> Self {
        Self {
            compiler,
            entries: BTreeMap::new(),
        }
    }

    /// Compiles and stores one method.
    pub fn register(&mut self, method: &QueryMethod) -> Result<&DerivedQuery, RegistryError> {
        if self.entries.contains_key(method.name.as_str()) {
            return Err(RegistryError::DuplicateMethod(method.name.clone()));
        }

        let compiled = self
            .compiler
            .compile(&method.domain_type, &method.name)
            .map_err(RegistryError::Compile)?;

        let query = DerivedQuery::new(compiled, method.result_shape);
        Ok(self.entries.entry(method.name.clone()).or_insert(query))
    }

    /// Registers every method, returning one result per method in input order.
    ///
    /// Failed methods are logged and skipped; successful ones stay registered.
    pub fn register_all<'m>(
        &mut self,
        methods: &'m [QueryMethod],
    ) -> Vec<(&'m str, Result<(), RegistryError>)> {
        methods
            .iter()
            .map(|method| {
                let result = self.register(method).map(|_| ());
                if let Err(err) = &result {
                    error!(
                        "event=query_register module=query status=error method={} error={}",
                        method.name, err
                    );
                }
                (method.name.as_str(), result)
            })
            .collect()
    }

    pub fn get(&self, method: &str) -> Option<&DerivedQuery> {
        self.entries.get(method)
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Method registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    Compile(CompileError),
    DuplicateMethod(String),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compile(err) => write!(f, "{err}"),
            Self::DuplicateMethod(name) => write!(f, "query method already registered: {name}"),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Compile(err) => Some(err),
            Self::DuplicateMethod(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DerivedQueryRegistry, RegistryError};
    use crate::model::mapping::{EntityType, MappingContext, ScalarType};
    use crate::query::compiler::DerivedQueryCompiler;
    use crate::query::runner::QueryMethod;
    use crate::sql::generator::DefaultSqlGenerator;

    fn mapping() -> MappingContext {
        MappingContext::from_entities(vec![EntityType::new("Person", "personId")
            .with_property("personId", ScalarType::Integer)
            .with_property("firstName", ScalarType::Text)])
        .expect("valid mapping")
    }

    #[test]
    fn rejects_duplicate_method_name() {
        let context = mapping();
        let mut registry = DerivedQueryRegistry::new(DerivedQueryCompiler::new(
            &context,
            DefaultSqlGenerator::new(&context),
        ));
        let method = QueryMethod::collection("findByFirstName", "Person");
        registry.register(&method).expect("first registration");
        let err = registry.register(&method).expect_err("duplicate");
        assert!(matches!(err, RegistryError::DuplicateMethod(_)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn failed_method_does_not_block_others() {
        let context = mapping();
        let mut registry = DerivedQueryRegistry::new(DerivedQueryCompiler::new(
            &context,
            DefaultSqlGenerator::new(&context),
        ));
        let methods = vec![
            QueryMethod::collection("deleteByFirstName", "Person"),
            QueryMethod::single("findByFirstName", "Person"),
        ];

        let results = registry.register_all(&methods);

        assert!(matches!(results[0], ("deleteByFirstName", Err(RegistryError::Compile(_)))));
        assert!(matches!(results[1], ("findByFirstName", Ok(()))));
        assert_eq!(registry.method_names().collect::<Vec<_>>(), vec!["findByFirstName"]);
    }
}
