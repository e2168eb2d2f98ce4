//! Column and relationship configuration
//!
//! Per-table filterable columns, search columns, default sort and
//! relationships, loaded from JSON or taken from the built-in catalogue.

mod builtin;
mod table;

pub use builtin::*;
pub use table::*;
