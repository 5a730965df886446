//! Entity mapping metadata.
//!
//! # Responsibility
//! - Describe mapped entity types, their properties and supertypes.
//! - Answer property and assignability lookups by table lookup.
//! - Load mapping documents from JSON configuration.
//!
//! # Invariants
//! - Entity names are unique within one context.
//! - Every `extends` and child entity reference names a known entity.
//! - The `extends` graph is acyclic.
//! - Every entity's `id` resolves to one of its (possibly inherited) properties.

use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Column-level value type of a scalar property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarType {
    Integer,
    Text,
    Real,
    Boolean,
    Blob,
}

impl ScalarType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Text => "text",
            Self::Real => "real",
            Self::Boolean => "boolean",
            Self::Blob => "blob",
        }
    }
}

/// Declared type of one property.
///
/// Serialized as a bare string for scalars (`"text"`) and as
/// `{ "entity": "Animal" }` for a one-to-one child entity reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyType {
    Scalar(ScalarType),
    Entity { entity: String },
}

impl PropertyType {
    pub fn entity(name: impl Into<String>) -> Self {
        Self::Entity {
            entity: name.into(),
        }
    }

    /// Target entity name when this property references a child entity.
    pub fn entity_name(&self) -> Option<&str> {
        match self {
            Self::Scalar(_) => None,
            Self::Entity { entity } => Some(entity.as_str()),
        }
    }
}

impl From<ScalarType> for PropertyType {
    fn from(value: ScalarType) -> Self {
        Self::Scalar(value)
    }
}

impl Display for PropertyType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalar(scalar) => write!(f, "{}", scalar.as_str()),
            Self::Entity { entity } => write!(f, "entity {entity}"),
        }
    }
}

/// One declared property of an entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: PropertyType,
    /// Explicit column name; defaults to the snake_case property name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

impl PropertyMeta {
    pub fn new(name: impl Into<String>, ty: impl Into<PropertyType>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            column: None,
        }
    }

    pub fn column_name(&self) -> String {
        match &self.column {
            Some(column) => column.clone(),
            None => self.name.to_case(Case::Snake),
        }
    }
}

/// Mapped entity type declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityType {
    pub name: String,
    /// Explicit table name; defaults to the snake_case entity name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// Name of the identifier property.
    pub id: String,
    /// Supertype whose properties this type inherits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyMeta>,
}

impl EntityType {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            id: id.into(),
            extends: None,
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, ty: impl Into<PropertyType>) -> Self {
        self.properties.push(PropertyMeta::new(name, ty));
        self
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn extending(mut self, supertype: impl Into<String>) -> Self {
        self.extends = Some(supertype.into());
        self
    }

    pub fn table_name(&self) -> String {
        match &self.table {
            Some(table) => table.clone(),
            None => self.name.to_case(Case::Snake),
        }
    }

    fn own_property(&self, name: &str) -> Option<&PropertyMeta> {
        self.properties.iter().find(|property| property.name == name)
    }
}

/// Property lookup result tagged with the type that declares it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyInfo<'a> {
    pub meta: &'a PropertyMeta,
    pub owning_type: &'a str,
}

impl<'a> PropertyInfo<'a> {
    pub fn name(&self) -> &'a str {
        self.meta.name.as_str()
    }

    pub fn ty(&self) -> &'a PropertyType {
        &self.meta.ty
    }
}

#[derive(Debug, Deserialize)]
struct MappingDocument {
    entities: Vec<EntityType>,
}

/// Read-only registry of mapped entity types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingContext {
    entities: BTreeMap<String, EntityType>,
}

impl MappingContext {
    /// Builds a validated context from entity declarations.
    pub fn from_entities(entities: Vec<EntityType>) -> Result<Self, MappingError> {
        let mut map = BTreeMap::new();
        for entity in entities {
            if entity.name.trim().is_empty() {
                return Err(MappingError::EmptyEntityName);
            }
            if map.contains_key(&entity.name) {
                return Err(MappingError::DuplicateEntity(entity.name));
            }
            map.insert(entity.name.clone(), entity);
        }

        let context = Self { entities: map };
        context.validate()?;
        Ok(context)
    }

    /// Parses and validates a JSON mapping document (`{ "entities": [..] }`).
    pub fn from_json_str(json: &str) -> Result<Self, MappingError> {
        let document: MappingDocument = serde_json::from_str(json).map_err(MappingError::Json)?;
        Self::from_entities(document.entities)
    }

    /// Reads and validates a JSON mapping document from disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, MappingError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| MappingError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn entity(&self, name: &str) -> Option<&EntityType> {
        self.entities.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(name)
    }

    pub fn entity_names(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    /// Returns all properties visible on `type_name`, supertype properties
    /// first, each tagged with its declaring type.
    ///
    /// A property redeclared on a subtype replaces the inherited one in place.
    pub fn properties_of(&self, type_name: &str) -> Option<Vec<PropertyInfo<'_>>> {
        let chain = self.hierarchy(type_name)?;
        let mut properties: Vec<PropertyInfo<'_>> = Vec::new();

        for entity in chain.iter().rev() {
            for meta in &entity.properties {
                let info = PropertyInfo {
                    meta,
                    owning_type: entity.name.as_str(),
                };
                match properties.iter_mut().find(|p| p.name() == meta.name) {
                    Some(slot) => *slot = info,
                    None => properties.push(info),
                }
            }
        }

        Some(properties)
    }

    /// Looks up one property visible on `type_name`, own declarations first.
    pub fn property(&self, type_name: &str, name: &str) -> Option<PropertyInfo<'_>> {
        self.hierarchy(type_name)?.into_iter().find_map(|entity| {
            entity.own_property(name).map(|meta| PropertyInfo {
                meta,
                owning_type: entity.name.as_str(),
            })
        })
    }

    /// Returns whether a `source` value can be used where `target` is expected,
    /// i.e. `target` is `source` or one of its supertypes.
    pub fn is_assignable_from(&self, target: &str, source: &str) -> bool {
        self.hierarchy(source)
            .is_some_and(|chain| chain.iter().any(|entity| entity.name == target))
    }

    /// Table name for a mapped type.
    pub fn table_name(&self, type_name: &str) -> Option<String> {
        self.entity(type_name).map(EntityType::table_name)
    }

    /// Column name of the identifier property of a mapped type.
    pub fn id_column(&self, type_name: &str) -> Option<String> {
        let entity = self.entity(type_name)?;
        self.property(type_name, &entity.id)
            .map(|info| info.meta.column_name())
    }

    /// Walks `type_name` and its supertypes, most specific first.
    fn hierarchy(&self, type_name: &str) -> Option<Vec<&EntityType>> {
        let mut chain = Vec::new();
        let mut current = self.entities.get(type_name)?;
        loop {
            chain.push(current);
            let Some(parent) = current.extends.as_deref() else {
                break;
            };
            // validate() rejects cycles before any lookup relies on this walk.
            if chain.len() > self.entities.len() {
                break;
            }
            match self.entities.get(parent) {
                Some(next) => current = next,
                None => break,
            }
        }
        Some(chain)
    }

    fn validate(&self) -> Result<(), MappingError> {
        for entity in self.entities.values() {
            let mut seen = BTreeSet::new();
            for property in &entity.properties {
                if property.name.trim().is_empty() {
                    return Err(MappingError::EmptyPropertyName(entity.name.clone()));
                }
                if !seen.insert(property.name.as_str()) {
                    return Err(MappingError::DuplicateProperty {
                        entity: entity.name.clone(),
                        property: property.name.clone(),
                    });
                }
                if let Some(target) = property.ty.entity_name() {
                    if !self.entities.contains_key(target) {
                        return Err(MappingError::UnknownChildEntity {
                            entity: entity.name.clone(),
                            property: property.name.clone(),
                            target: target.to_string(),
                        });
                    }
                }
            }

            if let Some(parent) = entity.extends.as_deref() {
                if !self.entities.contains_key(parent) {
                    return Err(MappingError::UnknownSupertype {
                        entity: entity.name.clone(),
                        supertype: parent.to_string(),
                    });
                }
            }
        }

        for entity in self.entities.values() {
            let mut visited = BTreeSet::new();
            let mut current = Some(entity.name.as_str());
            while let Some(name) = current {
                if !visited.insert(name) {
                    return Err(MappingError::InheritanceCycle(entity.name.clone()));
                }
                current = self
                    .entities
                    .get(name)
                    .and_then(|next| next.extends.as_deref());
            }
        }

        for entity in self.entities.values() {
            if self.property(&entity.name, &entity.id).is_none() {
                return Err(MappingError::MissingIdProperty {
                    entity: entity.name.clone(),
                    id: entity.id.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Mapping configuration errors.
#[derive(Debug)]
pub enum MappingError {
    EmptyEntityName,
    DuplicateEntity(String),
    EmptyPropertyName(String),
    DuplicateProperty {
        entity: String,
        property: String,
    },
    MissingIdProperty {
        entity: String,
        id: String,
    },
    UnknownSupertype {
        entity: String,
        supertype: String,
    },
    UnknownChildEntity {
        entity: String,
        property: String,
        target: String,
    },
    InheritanceCycle(String),
    Json(serde_json::Error),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for MappingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyEntityName => write!(f, "entity name must not be empty"),
            Self::DuplicateEntity(name) => write!(f, "entity declared twice: {name}"),
            Self::EmptyPropertyName(entity) => {
                write!(f, "entity `{entity}` declares a property with an empty name")
            }
            Self::DuplicateProperty { entity, property } => {
                write!(f, "entity `{entity}` declares property `{property}` twice")
            }
            Self::MissingIdProperty { entity, id } => {
                write!(f, "entity `{entity}` has no id property `{id}`")
            }
            Self::UnknownSupertype { entity, supertype } => {
                write!(f, "entity `{entity}` extends unknown type `{supertype}`")
            }
            Self::UnknownChildEntity {
                entity,
                property,
                target,
            } => write!(
                f,
                "property `{entity}.{property}` references unknown entity `{target}`"
            ),
            Self::InheritanceCycle(entity) => {
                write!(f, "inheritance cycle detected starting at `{entity}`")
            }
            Self::Json(err) => write!(f, "invalid mapping document: {err}"),
            Self::Io { path, source } => {
                write!(f, "cannot read mapping `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for MappingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
