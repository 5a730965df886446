//! Entity SQL generation for derived queries.
//!
//! # Responsibility
//! - Turn an aggregate root plus identifier set into select/count SQL text.
//! - Own table/column naming, joins and aliasing.
//!
//! # Invariants
//! - Conditions are emitted in identifier order and joined with `AND`.
//! - Every condition compares against a named parameter, never a literal.
//! - Direct one-to-one children are joined with `LEFT OUTER JOIN`; deeper
//!   levels are not loaded.

use crate::model::identifier::IdentifierSet;
use crate::model::mapping::MappingContext;
use crate::query::error::QueryViolation;

/// SQL text source used by the derived-query compiler.
pub trait EntitySqlGenerator {
    /// `SELECT COUNT(*)` over the root table.
    ///
    /// Predicates are not applied: a `countBy..` method counts every root row
    /// and its arguments are accepted but never bound.
    fn count_statement(&self, root: &str) -> Result<String, QueryViolation>;

    /// Selects all root rows (with direct children) matching every identifier.
    fn find_all_by_property(
        &self,
        root: &str,
        identifiers: &IdentifierSet,
    ) -> Result<String, QueryViolation>;
}

/// Generator deriving names from a `MappingContext`.
///
/// Child tables carry a back-reference column named after the root table,
/// e.g. `animal.person = person.person_id`.
#[derive(Debug, Clone, Copy)]
pub struct DefaultSqlGenerator<'ctx> {
    mapping: &'ctx MappingContext,
}

impl<'ctx> DefaultSqlGenerator<'ctx> {
    pub fn new(mapping: &'ctx MappingContext) -> Self {
        Self { mapping }
    }

    fn root_table(&self, root: &str) -> Result<String, QueryViolation> {
        self.mapping
            .table_name(root)
            .ok_or_else(|| QueryViolation::UnknownRootType(root.to_string()))
    }

    fn select_and_from(&self, root: &str) -> Result<String, QueryViolation> {
        let table = self.root_table(root)?;
        let id_column = self
            .mapping
            .id_column(root)
            .ok_or_else(|| QueryViolation::UnknownRootType(root.to_string()))?;
        let properties = self
            .mapping
            .properties_of(root)
            .ok_or_else(|| QueryViolation::UnknownRootType(root.to_string()))?;

        let mut columns = Vec::new();
        let mut joins = String::new();

        for property in &properties {
            let column = property.meta.column_name();
            let Some(child) = property.ty().entity_name() else {
                columns.push(format!("{table}.{column} AS {column}"));
                continue;
            };

            let child_table = self
                .mapping
                .table_name(child)
                .ok_or_else(|| QueryViolation::UnknownRootType(child.to_string()))?;
            let alias = column;
            for child_property in self.mapping.properties_of(child).unwrap_or_default() {
                if child_property.ty().entity_name().is_some() {
                    continue;
                }
                let child_column = child_property.meta.column_name();
                columns.push(format!(
                    "{alias}.{child_column} AS {alias}_{child_column}"
                ));
            }
            joins.push_str(&format!(
                " LEFT OUTER JOIN {child_table} AS {alias} ON {alias}.{table} = {table}.{id_column}"
            ));
        }

        Ok(format!("SELECT {} FROM {table}{joins}", columns.join(", ")))
    }
}

impl EntitySqlGenerator for DefaultSqlGenerator<'_> {
    fn count_statement(&self, root: &str) -> Result<String, QueryViolation> {
        let table = self.root_table(root)?;
        Ok(format!("SELECT COUNT(*) FROM {table}"))
    }

    fn find_all_by_property(
        &self,
        root: &str,
        identifiers: &IdentifierSet,
    ) -> Result<String, QueryViolation> {
        let mut sql = self.select_and_from(root)?;
        if identifiers.is_empty() {
            return Ok(sql);
        }

        let table = self.root_table(root)?;
        let mut conditions = Vec::with_capacity(identifiers.len());
        for identifier in identifiers {
            let property = self.mapping.property(root, identifier.name()).ok_or_else(|| {
                QueryViolation::UnresolvableProperty {
                    chunk: identifier.name().to_string(),
                    root: root.to_string(),
                }
            })?;
            if property.ty().entity_name().is_some() {
                return Err(QueryViolation::EntityValuedProperty(
                    identifier.name().to_string(),
                ));
            }
            conditions.push(format!(
                "{table}.{} = {}",
                property.meta.column_name(),
                identifier.placeholder().to_sql()
            ));
        }

        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
        Ok(sql)
    }
}
