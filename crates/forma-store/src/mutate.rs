//! Write-side mutation engine.
//!
//! `set_at` auto-vivifies missing intermediate containers: the container
//! kind is chosen by the next segment (`Key` makes an object, `Index` makes
//! an array) and array writes past the end pad with `null`. `null` nodes
//! count as absent and are replaced by a container when traversed through;
//! any other scalar in the way is a type conflict.
//!
//! `remove_at` deletes a node: object keys are removed, array indices are
//! spliced (subsequent elements shift left), matching JSON Patch `remove`.

use forma_path::{Path, Seg, LENGTH_TOKEN};
use serde_json::{Map, Value};

use crate::error::StoreError;

/// What a successful `remove_at` did to the tree.
#[derive(Debug)]
pub(crate) struct Removal {
    pub(crate) value: Value,
    /// True when an array index was spliced, shifting later elements.
    pub(crate) spliced: bool,
}

fn conflict(path: &Path, depth: usize) -> StoreError {
    StoreError::TypeConflict {
        path: path.clone(),
        segment: path.segments()[depth].to_string(),
    }
}

fn empty_container(next: &Seg) -> Value {
    match next {
        Seg::Index(_) => Value::Array(Vec::new()),
        _ => Value::Object(Map::new()),
    }
}

/// Mutable mirror of `resolve::node_at`.
fn node_at_mut<'a>(root: &'a mut Value, segments: &[Seg]) -> Option<&'a mut Value> {
    let mut current = root;
    for seg in segments {
        current = match (seg, current) {
            (Seg::Key(key), Value::Object(map)) => map.get_mut(key)?,
            (Seg::Index(index), Value::Array(arr)) => arr.get_mut(*index)?,
            (Seg::Index(index), Value::Object(map)) => map.get_mut(&index.to_string())?,
            _ => return None,
        };
    }
    Some(current)
}

/// Replace the value at `path`, creating missing intermediates.
///
/// A trailing `length` segment resizes the array at the prefix instead of
/// writing a node. On error the tree may be partially vivified; callers
/// that need atomicity roll back from a snapshot.
pub(crate) fn set_at(root: &mut Value, path: &Path, value: Value) -> Result<(), StoreError> {
    if path.is_empty() {
        *root = value;
        return Ok(());
    }
    if path.is_length() {
        return resize_at(root, path, value);
    }
    let segments = path.segments();
    let mut current = root;
    for (depth, seg) in segments.iter().enumerate() {
        let is_last = depth == segments.len() - 1;
        match seg {
            Seg::Key(key) => {
                if current.is_null() {
                    *current = Value::Object(Map::new());
                }
                let map = match current {
                    Value::Object(map) => map,
                    _ => return Err(conflict(path, depth)),
                };
                if is_last {
                    map.insert(key.clone(), value);
                    return Ok(());
                }
                current = map
                    .entry(key.clone())
                    .or_insert_with(|| empty_container(&segments[depth + 1]));
            }
            Seg::Index(index) => {
                if current.is_null() {
                    *current = Value::Array(Vec::new());
                }
                match current {
                    Value::Array(arr) => {
                        if *index >= arr.len() {
                            arr.resize(index + 1, Value::Null);
                        }
                        if is_last {
                            arr[*index] = value;
                            return Ok(());
                        }
                        current = &mut arr[*index];
                    }
                    Value::Object(map) => {
                        // Decimal-key fallback, mirroring read-side resolution.
                        let key = index.to_string();
                        if is_last {
                            map.insert(key, value);
                            return Ok(());
                        }
                        current = map
                            .entry(key)
                            .or_insert_with(|| empty_container(&segments[depth + 1]));
                    }
                    _ => return Err(conflict(path, depth)),
                }
            }
            // The parser only admits Length in final position, which is
            // handled above before the walk starts.
            Seg::Length => {
                return Err(StoreError::InvalidTarget { path: path.clone() });
            }
        }
    }
    Ok(())
}

/// Resize the array at the path's prefix (truncate or pad with `null`).
fn resize_at(root: &mut Value, path: &Path, value: Value) -> Result<(), StoreError> {
    let prefix = &path.segments()[..path.len() - 1];
    let target = node_at_mut(root, prefix).ok_or_else(|| StoreError::InvalidTarget {
        path: path.clone(),
    })?;
    match target {
        Value::Array(arr) => {
            let new_len = value
                .as_u64()
                .ok_or_else(|| StoreError::InvalidLength { path: path.clone() })?;
            arr.resize(new_len as usize, Value::Null);
            Ok(())
        }
        Value::Object(map) => {
            // Literal `length` key on objects, mirroring read-side fallback.
            map.insert(LENGTH_TOKEN.to_owned(), value);
            Ok(())
        }
        _ => Err(StoreError::TypeConflict {
            path: path.clone(),
            segment: LENGTH_TOKEN.to_owned(),
        }),
    }
}

/// Delete the node at `path`. Absent nodes are a no-op (`Ok(None)`).
pub(crate) fn remove_at(root: &mut Value, path: &Path) -> Result<Option<Removal>, StoreError> {
    if path.is_empty() || path.is_length() {
        return Err(StoreError::InvalidTarget { path: path.clone() });
    }
    let segments = path.segments();
    let (parent_segs, leaf) = (
        &segments[..segments.len() - 1],
        &segments[segments.len() - 1],
    );
    let Some(parent) = node_at_mut(root, parent_segs) else {
        return Ok(None);
    };
    match (parent, leaf) {
        (Value::Object(map), Seg::Key(key)) => Ok(map.remove(key).map(|value| Removal {
            value,
            spliced: false,
        })),
        (Value::Object(map), Seg::Index(index)) => {
            Ok(map.remove(&index.to_string()).map(|value| Removal {
                value,
                spliced: false,
            }))
        }
        (Value::Array(arr), Seg::Index(index)) => {
            if *index < arr.len() {
                Ok(Some(Removal {
                    value: arr.remove(*index),
                    spliced: true,
                }))
            } else {
                Ok(None)
            }
        }
        // A key cannot address an array element; nothing to remove.
        _ => Ok(None),
    }
}
