//! Free-text search

use crate::query::QueryHandle;

/// Case-insensitive substring search over one or more columns.
///
/// One column issues a single `ilike`; several are combined into one
/// `or` expression. An empty term or no columns leaves the query as is.
pub fn apply_search<H, S>(query: H, term: Option<&str>, columns: &[S]) -> H
where
    H: QueryHandle,
    S: AsRef<str>,
{
    let term = match term {
        Some(term) if !term.is_empty() => term,
        _ => return query,
    };
    let pattern = format!("%{}%", term);

    match columns {
        [] => query,
        [column] => query.ilike(column.as_ref(), &pattern),
        columns => {
            let expression = columns
                .iter()
                .map(|column| format!("{}.ilike.{}", column.as_ref(), pattern))
                .collect::<Vec<_>>()
                .join(",");
            query.or(&expression)
        }
    }
}
