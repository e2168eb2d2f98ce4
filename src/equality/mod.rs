//! Equality engine
//!
//! Canonical hashing and deep structural equality over dynamic values.
//! Hashes are candidate matches only: two values whose hashes agree must
//! still be confirmed with [`deep_equal`] before they are treated as
//! duplicates.

mod compare;
mod hash;
mod value;


pub use compare::*;
pub use hash::*;
pub use value::*;
