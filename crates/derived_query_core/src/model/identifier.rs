//! Resolved query parameters consumed by SQL generation.

use crate::model::mapping::PropertyType;
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Named SQL parameter an argument is bound to at execution time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Placeholder(String);

impl Placeholder {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        self.0.as_str()
    }

    /// Parameter reference as written into SQL text (`:firstName`).
    pub fn to_sql(&self) -> String {
        format!(":{}", self.0)
    }
}

impl Display for Placeholder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, ":{}", self.0)
    }
}

/// One column condition: property name, unbound placeholder and declared type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identifier {
    name: String,
    placeholder: Placeholder,
    #[serde(rename = "type")]
    ty: PropertyType,
}

impl Identifier {
    /// Builds an identifier whose placeholder shares the property name.
    pub fn of(name: impl Into<String>, ty: PropertyType) -> Self {
        let name = name.into();
        Self {
            placeholder: Placeholder::new(name.clone()),
            name,
            ty,
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn placeholder(&self) -> &Placeholder {
        &self.placeholder
    }

    pub fn ty(&self) -> &PropertyType {
        &self.ty
    }
}

/// Ordered identifiers keyed by property name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IdentifierSet {
    entries: Vec<Identifier>,
}

impl IdentifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(identifier: Identifier) -> Self {
        Self {
            entries: vec![identifier],
        }
    }

    /// Appends an identifier; hands it back when its name is already present.
    pub fn insert(&mut self, identifier: Identifier) -> Result<(), Identifier> {
        if self.contains(identifier.name()) {
            return Err(identifier);
        }
        self.entries.push(identifier);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Identifier> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identifier> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(Identifier::name).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a IdentifierSet {
    type Item = &'a Identifier;
    type IntoIter = std::slice::Iter<'a, Identifier>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{Identifier, IdentifierSet};
    use crate::model::mapping::ScalarType;

    #[test]
    fn insert_keeps_order_and_rejects_duplicate_names() {
        let mut set = IdentifierSet::new();
        set.insert(Identifier::of("lastName", ScalarType::Text.into()))
            .expect("first insert");
        set.insert(Identifier::of("firstName", ScalarType::Text.into()))
            .expect("second insert");
        let rejected = set
            .insert(Identifier::of("lastName", ScalarType::Integer.into()))
            .expect_err("duplicate name");

        assert_eq!(rejected.name(), "lastName");
        assert_eq!(set.names(), vec!["lastName", "firstName"]);
    }

    #[test]
    fn placeholder_renders_named_parameter() {
        let identifier = Identifier::of("firstName", ScalarType::Text.into());
        assert_eq!(identifier.placeholder().to_sql(), ":firstName");
        assert_eq!(identifier.placeholder().name(), "firstName");
    }
}
