//! Read-side path resolution over a value tree.
//!
//! Resolution never mutates and never fails: an unresolvable path is `None`.
//! The synthetic `length` suffix resolves to the element count of the array
//! at its prefix; when the prefix is an object the literal `"length"` key is
//! used instead, so plain data with a `length` field stays reachable.

use forma_path::{Path, Seg, LENGTH_TOKEN};
use serde_json::Value;

/// Resolve a plain (non-synthetic) segment sequence to a node.
///
/// Index segments fall back to decimal-string key lookup on objects.
pub fn node_at<'a>(root: &'a Value, segments: &[Seg]) -> Option<&'a Value> {
    let mut current = root;
    for seg in segments {
        current = match (seg, current) {
            (Seg::Key(key), Value::Object(map)) => map.get(key)?,
            (Seg::Index(index), Value::Array(arr)) => arr.get(*index)?,
            (Seg::Index(index), Value::Object(map)) => map.get(&index.to_string())?,
            _ => return None,
        };
    }
    Some(current)
}

/// Resolve a full path, including the synthetic `length` suffix.
pub fn value_at(root: &Value, path: &Path) -> Option<Value> {
    match path.last() {
        Some(Seg::Length) => {
            let prefix = &path.segments()[..path.len() - 1];
            match node_at(root, prefix)? {
                Value::Array(arr) => Some(Value::from(arr.len())),
                Value::Object(map) => map.get(LENGTH_TOKEN).cloned(),
                _ => None,
            }
        }
        _ => node_at(root, path.segments()).cloned(),
    }
}

/// Whether the path resolves to a present node.
///
/// Explicit `null` is present; a missing key or out-of-range index is not.
/// A `length` path is present iff its prefix is an array (or an object with
/// a literal `"length"` key).
pub fn is_present(root: &Value, path: &Path) -> bool {
    match path.last() {
        Some(Seg::Length) => {
            let prefix = &path.segments()[..path.len() - 1];
            match node_at(root, prefix) {
                Some(Value::Array(_)) => true,
                Some(Value::Object(map)) => map.contains_key(LENGTH_TOKEN),
                _ => false,
            }
        }
        _ => node_at(root, path.segments()).is_some(),
    }
}
