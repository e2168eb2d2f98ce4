//! Facet queries for filter controls
//!
//! Both variants leave out the filters on their own column, so an
//! option list keeps showing the counts it would have without its own
//! selection.

use crate::compiler::filters::apply_filters;
use crate::filter::Filter;
use crate::query::{CountMode, QueryClient, QueryHandle};

fn other_columns<'a>(filters: &'a [Filter], column: &'a str) -> impl Iterator<Item = &'a Filter> {
    filters.iter().filter(move |filter| filter.column_id != column)
}

/// Exact-count query over `column` under every other column's filters
pub fn build_faceted_count_query<C: QueryClient>(
    client: &C,
    table: &str,
    column: &str,
    filters: &[Filter],
) -> C::Handle {
    let query = client.from(table).select(column, Some(CountMode::Exact));
    apply_filters(query, other_columns(filters, column))
}

/// Minimum and maximum of `column` under every other column's filters
pub fn build_min_max_query<C: QueryClient>(
    client: &C,
    table: &str,
    column: &str,
    filters: &[Filter],
) -> C::Handle {
    let projection = format!("min:{0}.min(),max:{0}.max()", column);
    let query = client.from(table).select(&projection, None);
    apply_filters(query, other_columns(filters, column))
}
