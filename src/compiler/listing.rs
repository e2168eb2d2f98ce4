//! Primary listing query

use tracing::trace;

use crate::compiler::filters::apply_filters;
use crate::compiler::ordering::{apply_pagination, apply_sorting};
use crate::compiler::search::apply_search;
use crate::compiler::select::build_select_statement;
use crate::filter::QuerySpec;
use crate::query::{CountMode, QueryClient, QueryHandle};

/// Compile a full listing query: projection with exact count, filters,
/// search, sorting, then the page window.
pub fn build_query<C: QueryClient>(client: &C, spec: &QuerySpec) -> C::Handle {
    let projection = build_select_statement(spec.select.as_deref(), &spec.relationships);

    let query = client
        .from(&spec.table)
        .schema(&spec.schema)
        .select(&projection, Some(CountMode::Exact));
    let query = apply_filters(query, &spec.filters);
    let query = apply_search(query, spec.search_term.as_deref(), &spec.search_columns);
    let query = apply_sorting(query, &spec.sorting);

    trace!(
        table = %spec.table,
        filters = spec.filters.len(),
        search = spec.search_term.as_deref().is_some_and(|t| !t.is_empty()),
        paginated = spec.page.is_some() && spec.page_size.is_some(),
        "Compiled listing query"
    );

    apply_pagination(query, spec.page, spec.page_size)
}
