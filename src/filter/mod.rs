//! Filter model
//!
//! The data shapes the dashboard hands to the compiler: filters, sort
//! keys, relationships and the query specification. All of them are plain
//! immutable values deserialized from the dashboard's camelCase JSON.

mod model;
mod operators;
mod value;

pub use model::*;
pub use operators::*;
pub use value::*;
