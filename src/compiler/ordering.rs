//! Sorting and pagination

use crate::filter::SortConfig;
use crate::query::{QueryHandle, RowRange};

/// Issue one ordering per key; the first key is the primary one
pub fn apply_sorting<H: QueryHandle>(query: H, sorting: &[SortConfig]) -> H {
    sorting
        .iter()
        .fold(query, |query, sort| query.order(&sort.column, sort.ascending()))
}

/// Select the rows of a zero-based page. Skipped unless both parts are given.
pub fn apply_pagination<H: QueryHandle>(query: H, page: Option<u32>, page_size: Option<u32>) -> H {
    match (page, page_size) {
        (Some(page), Some(page_size)) => {
            let range = RowRange::for_page(page, page_size);
            query.range(range.from, range.to)
        }
        _ => query,
    }
}
