//! Canonical value hashing

use ahash::AHashMap;

use crate::equality::value::{format_number, Value};

/// Memo of already-hashed containers, keyed by container identity.
///
/// Lives for exactly one top-level [`deep_hash`] call. Never store one
/// across calls: identities are addresses and may be reused once a value
/// is dropped.
#[derive(Debug, Default)]
pub struct HashCache {
    entries: AHashMap<usize, String>,
}

impl HashCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct containers hashed so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Produce the canonical string for a value.
///
/// Primitives carry their type tag (`number:1` vs `string:1`), arrays keep
/// element order and objects are hashed with sorted keys.
pub fn deep_hash(value: &Value) -> String {
    let mut cache = HashCache::new();
    deep_hash_with(value, &mut cache)
}

/// [`deep_hash`] with a caller-supplied cache for the current pass
pub fn deep_hash_with(value: &Value, cache: &mut HashCache) -> String {
    if let Some(id) = value.identity() {
        if let Some(hit) = cache.entries.get(&id) {
            return hit.clone();
        }
    }

    let hash = match value {
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean:{}", b),
        Value::Number(n) => format!("number:{}", format_number(*n)),
        Value::String(s) => format!("string:{}", s),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .map(|item| deep_hash_with(item, cache))
                .collect();
            format!("array:[{}]", parts.join(","))
        }
        Value::Object(map) => {
            let parts: Vec<String> = map
                .iter()
                .map(|(key, item)| format!("{}:{}", key, deep_hash_with(item, cache)))
                .collect();
            format!("object:{{{}}}", parts.join(","))
        }
    };

    if let Some(id) = value.identity() {
        cache.entries.insert(id, hash.clone());
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitives_are_tagged() {
        assert_eq!(deep_hash(&Value::from(1)), "number:1");
        assert_eq!(deep_hash(&Value::from("1")), "string:1");
        assert_eq!(deep_hash(&Value::from(true)), "boolean:true");
        assert_ne!(deep_hash(&Value::from(1)), deep_hash(&Value::from("1")));
    }

    #[test]
    fn test_null_and_undefined_differ() {
        assert_eq!(deep_hash(&Value::Null), "null");
        assert_eq!(deep_hash(&Value::Undefined), "undefined");
    }

    #[test]
    fn test_array_order_matters() {
        let a = Value::array([Value::from(1), Value::from(2)]);
        let b = Value::array([Value::from(2), Value::from(1)]);
        assert_eq!(deep_hash(&a), "array:[number:1,number:2]");
        assert_ne!(deep_hash(&a), deep_hash(&b));
    }

    #[test]
    fn test_object_keys_sorted() {
        let a = Value::object([("b", Value::from(1)), ("a", Value::from(2))]);
        let b = Value::object([("a", Value::from(2)), ("b", Value::from(1))]);
        assert_eq!(deep_hash(&a), "object:{a:number:2,b:number:1}");
        assert_eq!(deep_hash(&a), deep_hash(&b));
    }

    #[test]
    fn test_cache_memoizes_shared_containers() {
        let leaf = Value::object([("x", Value::from(1))]);
        let mut level = leaf;
        for _ in 0..8 {
            level = Value::array([level.clone(), level.clone()]);
        }

        let mut cache = HashCache::new();
        let hash = deep_hash_with(&level, &mut cache);

        // one entry per distinct container: the leaf plus eight levels
        assert_eq!(cache.len(), 9);
        assert_eq!(hash, deep_hash(&level.deep_copy()));
    }

    #[test]
    fn test_string_encoding_can_collide() {
        // a comma inside a string mimics an element boundary
        let two = Value::array([Value::from("a"), Value::from("b")]);
        let one = Value::array([Value::from("a,string:b")]);
        assert_eq!(deep_hash(&two), deep_hash(&one));
        assert_ne!(two, one);
    }
}
