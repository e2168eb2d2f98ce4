//! Filter Query Core - filter-to-query compilation engine
//!
//! Compiles a dashboard's declarative filter, search, sort and pagination
//! state into calls on a lazy query handle, and provides the deep-equality
//! value sets the dashboard uses for multi-select filters.
//!
//! Python bindings via PyO3 are available behind the `python` feature.

pub mod compiler;
pub mod config;
pub mod equality;
pub mod error;
pub mod filter;
pub mod query;
pub mod value_set;

#[cfg(feature = "python")]
mod python;

pub use compiler::{
    apply_filter, apply_filters, apply_pagination, apply_search, apply_sorting,
    build_faceted_count_query, build_min_max_query, build_query, build_select_statement,
    FilterOutcome,
};
pub use error::{FilterQueryError, Result};
pub use filter::{Filter, FilterType, FilterValue, FiltersState, QuerySpec, SortConfig};
pub use query::{QueryClient, QueryHandle};
