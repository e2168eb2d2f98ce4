//! Query compiler
//!
//! Folds a query specification into calls on a [`QueryHandle`]. Every
//! entry point is a pure, single-pass fold: it never fails, never
//! executes anything and keeps no state between calls.
//!
//! [`QueryHandle`]: crate::query::QueryHandle

mod facets;
mod filters;
mod listing;
mod ordering;
mod search;
mod select;


pub use facets::*;
pub use filters::*;
pub use listing::*;
pub use ordering::*;
pub use search::*;
pub use select::*;
