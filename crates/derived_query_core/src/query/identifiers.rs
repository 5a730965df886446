//! Builds the identifier set for a validated predicate set.

use crate::model::identifier::{Identifier, IdentifierSet};
use crate::model::predicate::{Predicate, PredicateSet};
use crate::query::error::QueryViolation;

/// Converts predicates into identifiers keyed by leaf property name.
///
/// Declaration order is kept: the nth identifier binds the nth argument.
/// No value is bound here; placeholders are filled at execution time.
pub fn build_identifiers(set: &PredicateSet) -> Result<IdentifierSet, QueryViolation> {
    if let [only] = set.predicates() {
        return Ok(IdentifierSet::single(identifier_for(only)));
    }

    let mut identifiers = IdentifierSet::new();
    for predicate in set.predicates() {
        identifiers
            .insert(identifier_for(predicate))
            .map_err(|rejected| QueryViolation::DuplicateProperty(rejected.name().to_string()))?;
    }
    Ok(identifiers)
}

fn identifier_for(predicate: &Predicate) -> Identifier {
    Identifier::of(predicate.leaf_name(), predicate.leaf_type().clone())
}

#[cfg(test)]
mod tests {
    use super::build_identifiers;
    use crate::model::mapping::{EntityType, MappingContext, PropertyType, ScalarType};
    use crate::query::error::QueryViolation;
    use crate::query::parser::parse;

    fn mapping() -> MappingContext {
        MappingContext::from_entities(vec![EntityType::new("Person", "personId")
            .with_property("personId", ScalarType::Integer)
            .with_property("firstName", ScalarType::Text)
            .with_property("age", ScalarType::Integer)])
        .expect("valid mapping")
    }

    #[test]
    fn single_predicate_builds_one_identifier() {
        let set = parse("findByAge", &mapping(), "Person").expect("parse");
        let identifiers = build_identifiers(&set).expect("identifiers");
        assert_eq!(identifiers.names(), vec!["age"]);
        let age = identifiers.get("age").expect("age identifier");
        assert_eq!(age.ty(), &PropertyType::Scalar(ScalarType::Integer));
    }

    #[test]
    fn multiple_predicates_keep_declaration_order() {
        let set = parse("findByAgeAndFirstName", &mapping(), "Person").expect("parse");
        let identifiers = build_identifiers(&set).expect("identifiers");
        assert_eq!(identifiers.names(), vec!["age", "firstName"]);
    }

    #[test]
    fn repeated_property_is_rejected() {
        let set = parse("findByAgeAndAge", &mapping(), "Person").expect("parse");
        let err = build_identifiers(&set).expect_err("duplicate");
        assert_eq!(err, QueryViolation::DuplicateProperty("age".to_string()));
    }
}
