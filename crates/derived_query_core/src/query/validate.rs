//! Predicate-set validator stages.
//!
//! # Responsibility
//! - Enforce the connector, aggregate-boundary, column-leaf and arity rules
//!   on a parsed `PredicateSet`.
//!
//! # Invariants
//! - Stages are pure filters: they pass the set through untouched or fail.
//! - `validate_predicates` runs the stages in a fixed order and reports the
//!   first failure only.

use crate::model::mapping::MappingContext;
use crate::model::predicate::{Connector, PredicateSet};
use crate::query::error::QueryViolation;

/// Maximum number of predicates one derived method may declare.
pub const MAX_PREDICATES: usize = 2;

/// Rejects any connector other than `And`, including `And`/`Or` mixes.
pub fn check_connectors(set: &PredicateSet) -> Result<(), QueryViolation> {
    match set
        .connectors()
        .iter()
        .find(|connector| **connector != Connector::And)
    {
        Some(connector) => Err(QueryViolation::UnsupportedConnector(*connector)),
        None => Ok(()),
    }
}

/// Rejects predicates that reach outside the aggregate.
///
/// A property passes only when it is named directly on `root` and its owning
/// type is `root` or one of `root`'s supertypes. Any path through a child
/// entity fails, even when the leaf is declared on a supertype the child
/// shares with `root`.
pub fn check_aggregate_boundary(
    set: &PredicateSet,
    mapping: &MappingContext,
    root: &str,
) -> Result<(), QueryViolation> {
    for predicate in set.predicates() {
        if predicate.property_path().len() > 1 {
            let child = mapping
                .property(root, predicate.segment())
                .and_then(|property| property.ty().entity_name())
                .unwrap_or(predicate.owning_type());
            return Err(QueryViolation::CrossAggregate {
                property: predicate.dotted_path(),
                owning_type: child.to_string(),
                root: root.to_string(),
            });
        }
        if !mapping.is_assignable_from(predicate.owning_type(), root) {
            return Err(QueryViolation::CrossAggregate {
                property: predicate.dotted_path(),
                owning_type: predicate.owning_type().to_string(),
                root: root.to_string(),
            });
        }
    }
    Ok(())
}

/// Rejects predicates on entity-typed properties; children are joined, not
/// stored as a root column.
pub fn check_column_leaves(set: &PredicateSet) -> Result<(), QueryViolation> {
    match set
        .predicates()
        .iter()
        .find(|predicate| predicate.leaf_type().entity_name().is_some())
    {
        Some(predicate) => Err(QueryViolation::EntityValuedProperty(
            predicate.dotted_path(),
        )),
        None => Ok(()),
    }
}

pub fn check_arity(set: &PredicateSet) -> Result<(), QueryViolation> {
    if set.len() > MAX_PREDICATES {
        return Err(QueryViolation::TooManyPredicates {
            count: set.len(),
            max: MAX_PREDICATES,
        });
    }
    Ok(())
}

pub fn check_not_empty(set: &PredicateSet) -> Result<(), QueryViolation> {
    if set.is_empty() {
        return Err(QueryViolation::EmptyQuery);
    }
    Ok(())
}

/// Runs connector, boundary, column-leaf, arity and emptiness checks in that
/// order.
pub fn validate_predicates(
    set: &PredicateSet,
    mapping: &MappingContext,
    root: &str,
) -> Result<(), QueryViolation> {
    check_connectors(set)?;
    check_aggregate_boundary(set, mapping, root)?;
    check_column_leaves(set)?;
    check_arity(set)?;
    check_not_empty(set)
}

#[cfg(test)]
mod tests {
    use super::{validate_predicates, MAX_PREDICATES};
    use crate::model::mapping::{EntityType, MappingContext, PropertyType, ScalarType};
    use crate::query::error::QueryViolation;
    use crate::query::parser::parse;

    fn mapping() -> MappingContext {
        MappingContext::from_entities(vec![
            EntityType::new("Auditable", "id")
                .with_property("id", ScalarType::Integer)
                .with_property("createdBy", ScalarType::Text),
            EntityType::new("Person", "id")
                .extending("Auditable")
                .with_property("firstName", ScalarType::Text)
                .with_property("lastName", ScalarType::Text)
                .with_property("email", ScalarType::Text)
                .with_property("animal", PropertyType::entity("Animal")),
            EntityType::new("Animal", "id")
                .extending("Auditable")
                .with_property("nickName", ScalarType::Text),
        ])
        .expect("valid mapping")
    }

    fn validate(method: &str) -> Result<(), QueryViolation> {
        let context = mapping();
        let set = parse(method, &context, "Person").expect("parse");
        validate_predicates(&set, &context, "Person")
    }

    #[test]
    fn accepts_root_and_inherited_properties() {
        validate("findByFirstName").expect("root property");
        validate("findByCreatedByAndLastName").expect("inherited property");
    }

    #[test]
    fn rejects_child_entity_property() {
        let err = validate("findByAnimalNickName").expect_err("cross aggregate");
        assert_eq!(
            err,
            QueryViolation::CrossAggregate {
                property: "animal.nickName".to_string(),
                owning_type: "Animal".to_string(),
                root: "Person".to_string(),
            }
        );
    }

    #[test]
    fn rejects_child_path_to_shared_supertype_property() {
        let err = validate("findByAnimalCreatedBy").expect_err("path through child");
        assert_eq!(
            err,
            QueryViolation::CrossAggregate {
                property: "animal.createdBy".to_string(),
                owning_type: "Animal".to_string(),
                root: "Person".to_string(),
            }
        );
    }

    #[test]
    fn rejects_entity_typed_property() {
        let err = validate("findByAnimal").expect_err("entity leaf");
        assert_eq!(
            err,
            QueryViolation::EntityValuedProperty("animal".to_string())
        );
    }

    #[test]
    fn connector_check_runs_before_arity() {
        let err = validate("findByFirstNameOrLastNameAndEmail").expect_err("or is unsupported");
        assert!(matches!(err, QueryViolation::UnsupportedConnector(_)));
    }

    #[test]
    fn boundary_check_runs_before_arity() {
        let err = validate("findByFirstNameAndLastNameAndAnimalNickName")
            .expect_err("cross aggregate wins");
        assert!(matches!(err, QueryViolation::CrossAggregate { .. }));
    }

    #[test]
    fn rejects_more_than_max_predicates() {
        let err = validate("findByFirstNameAndLastNameAndEmail").expect_err("too many");
        assert_eq!(
            err,
            QueryViolation::TooManyPredicates {
                count: 3,
                max: MAX_PREDICATES,
            }
        );
    }

    #[test]
    fn rejects_empty_predicate_set() {
        let err = validate("findAll").expect_err("empty");
        assert_eq!(err, QueryViolation::EmptyQuery);
    }
}
