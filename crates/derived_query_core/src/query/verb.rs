//! Read-only verb classification.

use crate::model::predicate::Verb;
use crate::query::error::QueryViolation;

/// Returns whether `verb` only reads data.
pub fn is_read_only(verb: &Verb) -> bool {
    !matches!(verb, Verb::Other(_))
}

/// Rejects every verb outside `find|read|get|query|stream|count|exists`.
pub fn classify(verb: &Verb) -> Result<(), QueryViolation> {
    if is_read_only(verb) {
        return Ok(());
    }
    Err(QueryViolation::UnsupportedModifyingQuery(
        verb.keyword().to_string(),
    ))
}
