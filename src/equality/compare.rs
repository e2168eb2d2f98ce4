//! Structural and strict equality

use std::sync::Arc;

use crate::equality::value::Value;

/// Recursive structural equality.
///
/// Arrays compare length then elements, objects compare key sets then
/// values per key, everything else falls back to [`is_identical`].
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    if is_identical(a, b) {
        return true;
    }

    match (a, b) {
        (Value::Array(left), Value::Array(right)) => {
            left.len() == right.len()
                && left.iter().zip(right.iter()).all(|(l, r)| deep_equal(l, r))
        }
        (Value::Object(left), Value::Object(right)) => {
            left.len() == right.len()
                && left.keys().eq(right.keys())
                && left
                    .iter()
                    .all(|(key, l)| right.get(key).is_some_and(|r| deep_equal(l, r)))
        }
        _ => false,
    }
}

/// Strict equality: primitives by value, containers by identity.
///
/// `NaN` is not identical to itself and `0 == -0`, matching IEEE semantics.
pub fn is_identical(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(l), Value::Bool(r)) => l == r,
        (Value::Number(l), Value::Number(r)) => l == r,
        (Value::String(l), Value::String(r)) => l == r,
        (Value::Array(l), Value::Array(r)) => Arc::ptr_eq(l, r),
        (Value::Object(l), Value::Object(r)) => Arc::ptr_eq(l, r),
        _ => false,
    }
}
