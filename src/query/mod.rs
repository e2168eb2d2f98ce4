//! Query handle abstraction
//!
//! The compiler only ever talks to a [`QueryHandle`]: a lazy, chainable
//! description of a backend request. Two adapters ship with the crate:
//! [`postgrest`] builds the REST request a PostgREST/Supabase backend
//! expects, [`memory`] records every call and can evaluate the result
//! over in-memory rows.

mod expr;
pub mod memory;
pub mod postgrest;

use serde::{Deserialize, Serialize};

use crate::filter::FilterValue;

pub use memory::{MemoryClient, MemoryQuery, QueryOp, QueryResult, Row};
pub use postgrest::{PostgrestClient, PostgrestQuery};

/// Row-count strategy requested alongside a select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountMode {
    Exact,
    Planned,
    Estimated,
}

impl CountMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CountMode::Exact => "exact",
            CountMode::Planned => "planned",
            CountMode::Estimated => "estimated",
        }
    }
}

/// Closed row-index interval `[from, to]`.
///
/// `to < from` describes an empty window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub from: i64,
    pub to: i64,
}

impl RowRange {
    /// Window for a zero-based page
    pub fn for_page(page: u32, page_size: u32) -> Self {
        let from = i64::from(page).saturating_mul(i64::from(page_size));
        Self {
            from,
            to: from.saturating_add(i64::from(page_size)) - 1,
        }
    }

    /// Number of rows the window can hold
    pub fn len(&self) -> usize {
        let span = i128::from(self.to) - i128::from(self.from) + 1;
        if span <= 0 {
            0
        } else {
            usize::try_from(span).unwrap_or(usize::MAX)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Entry point of a backend: opens a handle on a table
pub trait QueryClient {
    type Handle: QueryHandle;

    fn from(&self, table: &str) -> Self::Handle;
}

/// Chainable query description.
///
/// Every method consumes the handle and returns the narrowed one;
/// nothing is executed here.
pub trait QueryHandle: Sized {
    /// Target a non-default schema
    fn schema(self, schema: &str) -> Self;

    fn select(self, projection: &str, count: Option<CountMode>) -> Self;

    fn eq(self, column: &str, value: &FilterValue) -> Self;

    fn neq(self, column: &str, value: &FilterValue) -> Self;

    /// Set membership
    fn in_(self, column: &str, values: &[FilterValue]) -> Self;

    /// Negate a raw `operator.value` filter, value passed through verbatim
    fn not(self, column: &str, operator: &str, value: &str) -> Self;

    /// Case-insensitive pattern match (`%` and `_` wildcards)
    fn ilike(self, column: &str, pattern: &str) -> Self;

    /// Array column shares at least one element with `values`
    fn overlaps(self, column: &str, values: &[FilterValue]) -> Self;

    /// Array column holds every element of `values`
    fn contains(self, column: &str, values: &[FilterValue]) -> Self;

    fn gt(self, column: &str, value: &FilterValue) -> Self;

    fn gte(self, column: &str, value: &FilterValue) -> Self;

    fn lt(self, column: &str, value: &FilterValue) -> Self;

    fn lte(self, column: &str, value: &FilterValue) -> Self;

    /// Disjunction of comma-separated `column.operator.value` filters
    fn or(self, filters: &str) -> Self;

    fn order(self, column: &str, ascending: bool) -> Self;

    fn range(self, from: i64, to: i64) -> Self;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_range_for_page() {
        assert_eq!(RowRange::for_page(2, 25), RowRange { from: 50, to: 74 });
        assert_eq!(RowRange::for_page(0, 10), RowRange { from: 0, to: 9 });
        assert_eq!(RowRange::for_page(2, 25).len(), 25);
    }

    #[test]
    fn test_zero_page_size_is_empty() {
        let range = RowRange::for_page(0, 0);
        assert_eq!(range, RowRange { from: 0, to: -1 });
        assert!(range.is_empty());
    }

    #[test]
    fn test_large_pages_do_not_overflow() {
        let range = RowRange::for_page(u32::MAX, 1000);
        assert_eq!(range.len(), 1000);

        let range = RowRange::for_page(u32::MAX, u32::MAX);
        assert_eq!(range.from, i64::MAX);
    }
}
