//! Projection building

use crate::filter::Relationships;

/// Projection used when no explicit select is given
pub const WILDCARD: &str = "*";

/// Build the select projection for a listing query.
///
/// An explicit projection is passed through verbatim. Otherwise every
/// relationship, in insertion order, is embedded as `alias:table(*)`
/// after the wildcard. Single and many relationships embed the same way.
pub fn build_select_statement(select: Option<&str>, relationships: &Relationships) -> String {
    // an empty projection counts as absent
    if let Some(select) = select.filter(|s| !s.is_empty()) {
        return select.to_string();
    }

    let mut projection = WILDCARD.to_string();
    for (alias, relationship) in relationships.iter() {
        projection.push_str(&format!(",{}:{}(*)", alias, relationship.table));
    }
    projection
}
