//! Method-name tokenizer and property-path resolver.
//!
//! # Responsibility
//! - Split a camel-case method name into verb, subject and predicate chunks.
//! - Resolve each chunk to a property path against mapping metadata.
//!
//! # Invariants
//! - Tokenizing is purely lexical and never consults the mapping.
//! - A connector keyword only splits when it is followed by an upper-case or
//!   non-ASCII letter and does not open the chunk (`Orchestra`, `OrderId`).
//! - An unresolvable chunk is an error, never skipped or guessed.

use crate::model::mapping::{MappingContext, PropertyInfo, PropertyType};
use crate::model::predicate::{Connector, Predicate, PredicateSet, Verb};
use crate::query::error::QueryViolation;
use once_cell::sync::Lazy;
use regex::Regex;

static VERB_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\p{Ll}+").expect("valid verb regex"));
static SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\p{Lu}.*?)??By").expect("valid separator regex"));
static CONNECTOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"And|Or").expect("valid connector regex"));

/// Explicit path separator inside one predicate chunk (`Animal_NickName`).
const PATH_SEPARATOR: char = '_';

/// Lexical split of a method name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodNameTokens {
    /// Leading lower-case keyword, e.g. `find` or `delete`.
    pub verb: String,
    /// Text between verb and `By`, or the whole tail when there is no `By`.
    pub subject: Option<String>,
    /// Raw predicate chunks in declaration order.
    pub parts: Vec<String>,
    /// Connector keywords between consecutive chunks.
    pub connectors: Vec<Connector>,
}

/// Splits `method` into verb, subject and predicate chunks.
///
/// A name without a `By` separator (`findAll`) yields no chunks.
pub fn tokenize(method: &str) -> Result<MethodNameTokens, QueryViolation> {
    if let Some(invalid) = method
        .chars()
        .find(|c| !c.is_alphanumeric() && *c != PATH_SEPARATOR)
    {
        return Err(QueryViolation::MalformedMethodName(format!(
            "unexpected character `{invalid}`"
        )));
    }

    let Some(verb_match) = VERB_RE.find(method) else {
        return Err(QueryViolation::MalformedMethodName(
            "expected a lower-case verb such as `find`".to_string(),
        ));
    };
    let verb = verb_match.as_str().to_string();
    let rest = &method[verb_match.end()..];

    let Some(captures) = SEPARATOR_RE.captures(rest) else {
        return Ok(MethodNameTokens {
            verb,
            subject: (!rest.is_empty()).then(|| rest.to_string()),
            parts: Vec::new(),
            connectors: Vec::new(),
        });
    };

    let subject = captures.get(1).map(|m| m.as_str().to_string());
    let separator_end = captures.get(0).map_or(rest.len(), |m| m.end());
    let (parts, connectors) = split_predicates(&rest[separator_end..]);

    Ok(MethodNameTokens {
        verb,
        subject,
        parts,
        connectors,
    })
}

fn split_predicates(text: &str) -> (Vec<String>, Vec<Connector>) {
    if text.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let mut parts = Vec::new();
    let mut connectors = Vec::new();
    let mut chunk_start = 0;

    for found in CONNECTOR_RE.find_iter(text) {
        if found.start() == chunk_start {
            continue;
        }
        let followed_by_word = text[found.end()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_uppercase() || !c.is_ascii());
        if !followed_by_word {
            continue;
        }
        let Some(connector) = Connector::from_keyword(found.as_str()) else {
            continue;
        };

        parts.push(text[chunk_start..found.start()].to_string());
        connectors.push(connector);
        chunk_start = found.end();
    }
    parts.push(text[chunk_start..].to_string());

    (parts, connectors)
}

/// Resolves tokenized chunks to predicates on `root`.
pub fn resolve(
    tokens: &MethodNameTokens,
    mapping: &MappingContext,
    root: &str,
) -> Result<PredicateSet, QueryViolation> {
    if !mapping.contains(root) {
        return Err(QueryViolation::UnknownRootType(root.to_string()));
    }

    let mut predicates = Vec::with_capacity(tokens.parts.len());
    for chunk in &tokens.parts {
        let unresolvable = || QueryViolation::UnresolvableProperty {
            chunk: chunk.clone(),
            root: root.to_string(),
        };
        let path = resolve_path(mapping, root, chunk).ok_or_else(unresolvable)?;
        let predicate = Predicate::new(path.segments, path.leaf_type, path.owning_type)
            .ok_or_else(unresolvable)?;
        predicates.push(predicate);
    }

    Ok(PredicateSet::new(
        Verb::from_keyword(&tokens.verb),
        tokens.subject.clone(),
        predicates,
        tokens.connectors.clone(),
    ))
}

/// Tokenizes and resolves `method` in one step.
pub fn parse(
    method: &str,
    mapping: &MappingContext,
    root: &str,
) -> Result<PredicateSet, QueryViolation> {
    let tokens = tokenize(method)?;
    resolve(&tokens, mapping, root)
}

struct ResolvedPath {
    segments: Vec<String>,
    leaf_type: PropertyType,
    owning_type: String,
}

impl ResolvedPath {
    fn leaf(property: PropertyInfo<'_>) -> Self {
        Self {
            segments: vec![property.name().to_string()],
            leaf_type: property.ty().clone(),
            owning_type: property.owning_type.to_string(),
        }
    }

    fn prefixed(mut self, head: &str) -> Self {
        self.segments.insert(0, head.to_string());
        self
    }
}

/// Resolves one chunk on `type_name`.
///
/// The whole chunk is tried first, then camel-case split points from the
/// right so the longest matching head wins. `_` forces a split.
fn resolve_path(mapping: &MappingContext, type_name: &str, chunk: &str) -> Option<ResolvedPath> {
    if chunk.is_empty() {
        return None;
    }

    if let Some((head, tail)) = chunk.split_once(PATH_SEPARATOR) {
        let property = lookup(mapping, type_name, head)?;
        let target = property.ty().entity_name()?;
        return resolve_path(mapping, target, tail).map(|path| path.prefixed(property.name()));
    }

    if let Some(property) = lookup(mapping, type_name, chunk) {
        return Some(ResolvedPath::leaf(property));
    }

    let boundaries: Vec<usize> = chunk
        .char_indices()
        .skip(1)
        .filter(|(_, c)| c.is_uppercase())
        .map(|(index, _)| index)
        .collect();

    for &index in boundaries.iter().rev() {
        let (head, tail) = chunk.split_at(index);
        let Some(property) = lookup(mapping, type_name, head) else {
            continue;
        };
        let Some(target) = property.ty().entity_name() else {
            continue;
        };
        if let Some(path) = resolve_path(mapping, target, tail) {
            return Some(path.prefixed(property.name()));
        }
    }

    None
}

fn lookup<'a>(mapping: &'a MappingContext, type_name: &str, raw: &str) -> Option<PropertyInfo<'a>> {
    let bean_name = decapitalize(raw);
    if let Some(property) = mapping.property(type_name, &bean_name) {
        return Some(property);
    }

    let mut chars = raw.chars();
    let first = chars.next()?;
    let lowered: String = first.to_lowercase().chain(chars).collect();
    if lowered == bean_name {
        return None;
    }
    mapping.property(type_name, &lowered)
}

/// JavaBeans decapitalization: `FirstName` -> `firstName`, `URL` stays `URL`.
fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    let second = chars.clone().next();

    if first.is_uppercase() && second.is_some_and(char::is_uppercase) {
        return name.to_string();
    }

    first.to_lowercase().chain(chars).collect()
}
