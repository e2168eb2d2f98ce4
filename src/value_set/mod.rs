//! Value-set operations for multi-select filter values
//!
//! Adding deduplicates by deep equality. Removing, intersecting and
//! membership use strict equality, so a structurally equal but separately
//! built value is *not* removed from a set.

mod ops;


pub use ops::*;
