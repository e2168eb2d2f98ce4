//! Set operations over ordered value sequences

use ahash::AHashMap;
use smallvec::SmallVec;

use crate::equality::{deep_equal, deep_hash, is_identical, Value};

/// Stable deduplication by deep equality.
///
/// Items are bucketed by [`deep_hash`]; within a bucket each candidate is
/// confirmed with [`deep_equal`] so hash collisions never drop a value.
/// The first occurrence of each value wins.
pub fn uniq(values: &[Value]) -> Vec<Value> {
    let mut buckets: AHashMap<String, SmallVec<[usize; 1]>> =
        AHashMap::with_capacity(values.len());
    let mut out: Vec<Value> = Vec::with_capacity(values.len());

    for value in values {
        let bucket = buckets.entry(deep_hash(value)).or_default();
        if bucket.iter().any(|&idx| deep_equal(&out[idx], value)) {
            continue;
        }
        bucket.push(out.len());
        out.push(value.clone());
    }

    out
}

/// Append `values` to `set`, dropping deep duplicates
pub fn add_uniq(set: &[Value], values: &[Value]) -> Vec<Value> {
    let combined: Vec<Value> = set.iter().chain(values.iter()).cloned().collect();
    uniq(&combined)
}

/// Remove every element of `set` strictly contained in `values`.
///
/// Containers match by identity only; see [`is_any_of`].
pub fn remove_uniq(set: &[Value], values: &[Value]) -> Vec<Value> {
    set.iter()
        .filter(|value| !is_any_of(value, values))
        .cloned()
        .collect()
}

/// Elements of `a` strictly contained in `b`, in `a`'s order
pub fn intersection(a: &[Value], b: &[Value]) -> Vec<Value> {
    a.iter().filter(|value| is_any_of(value, b)).cloned().collect()
}

/// Strict membership test
#[inline]
pub fn is_any_of(value: &Value, values: &[Value]) -> bool {
    values.iter().any(|candidate| is_identical(value, candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nums(ns: &[i32]) -> Vec<Value> {
        ns.iter().map(|&n| Value::from(n)).collect()
    }

    #[test]
    fn test_uniq_preserves_first_seen_order() {
        assert_eq!(uniq(&nums(&[3, 1, 3, 2])), nums(&[3, 1, 2]));
    }

    #[test]
    fn test_uniq_deep_duplicates() {
        let a = Value::object([("a", Value::from(1))]);
        let b = Value::object([("a", Value::from(1))]);
        assert_eq!(uniq(&[a, b]).len(), 1);
    }

    #[test]
    fn test_uniq_keeps_hash_collisions() {
        let two = Value::array([Value::from("a"), Value::from("b")]);
        let one = Value::array([Value::from("a,string:b")]);
        assert_eq!(deep_hash(&two), deep_hash(&one));

        let out = uniq(&[two.clone(), one.clone(), two.deep_copy()]);
        assert_eq!(out.len(), 2);
        assert!(is_identical(&out[0], &two));
        assert!(is_identical(&out[1], &one));
    }

    #[test]
    fn test_uniq_does_not_mix_types() {
        let values = vec![Value::from(1), Value::from("1"), Value::from(true), Value::Null];
        assert_eq!(uniq(&values).len(), 4);
    }

    #[test]
    fn test_add_uniq_deduplicates_deeply() {
        let set = vec![Value::object([("a", Value::from(1))])];
        let added = add_uniq(&set, &[Value::object([("a", Value::from(1))])]);
        assert_eq!(added.len(), 1);

        let added = add_uniq(&nums(&[1, 2]), &nums(&[2, 3]));
        assert_eq!(added, nums(&[1, 2, 3]));
    }

    #[test]
    fn test_remove_uniq_is_shallow() {
        let obj = Value::object([("a", Value::from(1))]);
        let set = vec![obj.clone()];

        // equal but separately built: stays
        let fresh = Value::object([("a", Value::from(1))]);
        assert_eq!(remove_uniq(&set, &[fresh]).len(), 1);

        // same container: removed
        assert!(remove_uniq(&set, &[obj]).is_empty());
    }

    #[test]
    fn test_remove_uniq_primitives() {
        assert_eq!(remove_uniq(&nums(&[1, 2, 3]), &nums(&[2])), nums(&[1, 3]));
        assert_eq!(
            remove_uniq(&[Value::from("active")], &[Value::from("active")]),
            Vec::<Value>::new()
        );
    }

    #[test]
    fn test_intersection_and_is_any_of() {
        assert_eq!(intersection(&nums(&[1, 2, 3]), &nums(&[3, 1])), nums(&[1, 3]));

        let obj = Value::array([Value::from(1)]);
        assert!(intersection(&[obj.clone()], &[obj.deep_copy()]).is_empty());
        assert!(is_any_of(&obj, &[Value::Null, obj.clone()]));
        assert!(!is_any_of(&Value::from(1), &[Value::from("1")]));
    }
}
