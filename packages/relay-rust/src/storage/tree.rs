//! JSON document tree primitives.
//!
//! The store is one JSON object. Writing `null` (or a value that normalizes
//! to an empty object) deletes the node, and ancestors left empty by a
//! delete are pruned, so "absent" and "empty" are never distinguishable.

use lobby_core::StorePath;
use serde_json::{Map, Value};

/// Reads the node at `path`. Root always resolves.
pub fn get_at<'a>(root: &'a Value, path: &StorePath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(root, |node, segment| node.as_object()?.get(segment))
}

/// Writes `value` at `path`, returning the previous node if there was one.
///
/// The value is normalized first; a normalized `null` removes the node.
pub fn set_at(root: &mut Value, path: &StorePath, value: Value) -> Option<Value> {
    let value = normalize(value);
    if path.is_root() {
        let replacement = if value.is_null() {
            Value::Object(Map::new())
        } else {
            value
        };
        let old = std::mem::replace(root, replacement);
        return present(old);
    }

    if value.is_null() {
        return remove_at(root, path.segments());
    }

    insert_at(root, path.segments(), value)
}

/// Drops `null` members and empty objects, recursively.
///
/// Returns `Value::Null` if nothing remains.
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let cleaned: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, normalize(v)))
                .filter(|(_, v)| !v.is_null())
                .collect();
            if cleaned.is_empty() {
                Value::Null
            } else {
                Value::Object(cleaned)
            }
        }
        other => other,
    }
}

fn remove_at(node: &mut Value, segments: &[String]) -> Option<Value> {
    let (first, rest) = segments.split_first()?;
    let map = node.as_object_mut()?;
    if rest.is_empty() {
        return map.remove(first);
    }
    let child = map.get_mut(first)?;
    let removed = remove_at(child, rest);
    let emptied = child.as_object().is_some_and(Map::is_empty);
    if emptied {
        map.remove(first);
    }
    removed
}

/// Inserts below `node`, turning `node` and any missing or scalar
/// intermediate into an object on the way down.
fn insert_at(node: &mut Value, segments: &[String], value: Value) -> Option<Value> {
    let (first, rest) = segments.split_first()?;
    let mut map = match std::mem::take(node) {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let old = if rest.is_empty() {
        map.insert(first.clone(), value)
    } else {
        insert_at(map.entry(first.clone()).or_insert(Value::Null), rest, value)
    };
    *node = Value::Object(map);
    old
}

fn present(value: Value) -> Option<Value> {
    match value {
        Value::Object(ref map) if map.is_empty() => None,
        Value::Null => None,
        other => Some(other),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn path(raw: &str) -> StorePath {
        StorePath::parse(raw).unwrap()
    }

    #[test]
    fn set_creates_intermediate_objects() {
        let mut root = json!({});
        assert!(set_at(&mut root, &path("games/g1/status"), json!("Open")).is_none());
        assert_eq!(root, json!({ "games": { "g1": { "status": "Open" } } }));
        assert_eq!(get_at(&root, &path("games/g1/status")), Some(&json!("Open")));
    }

    #[test]
    fn set_replaces_whole_subtree() {
        let mut root = json!({ "games": { "g1": { "status": "Open", "joinRequests": { "r": 1 } } } });
        let old = set_at(&mut root, &path("games/g1"), json!({ "status": "Running" }));
        assert_eq!(old, Some(json!({ "status": "Open", "joinRequests": { "r": 1 } })));
        assert_eq!(root, json!({ "games": { "g1": { "status": "Running" } } }));
    }

    #[test]
    fn null_removes_and_prunes_empty_parents() {
        let mut root = json!({ "players": { "p1": { "name": "Ann" } } });
        let old = set_at(&mut root, &path("players/p1/name"), Value::Null);
        assert_eq!(old, Some(json!("Ann")));
        assert_eq!(root, json!({}));
        assert!(get_at(&root, &path("players")).is_none());
    }

    #[test]
    fn remove_of_missing_node_is_none() {
        let mut root = json!({ "games": { "g1": { "status": "Open" } } });
        assert!(set_at(&mut root, &path("games/g2"), Value::Null).is_none());
        assert!(set_at(&mut root, &path("chat/c1/text"), Value::Null).is_none());
        assert_eq!(root, json!({ "games": { "g1": { "status": "Open" } } }));
    }

    #[test]
    fn writing_through_a_scalar_replaces_it() {
        let mut root = json!({ "games": { "g1": "placeholder" } });
        set_at(&mut root, &path("games/g1/status"), json!("Open"));
        assert_eq!(root, json!({ "games": { "g1": { "status": "Open" } } }));
    }

    #[test]
    fn deep_write_through_non_objects_rebuilds_the_branch() {
        let mut root = json!({ "games": [1, 2], "chat": { "c1": { "text": "hi" } } });
        let old = set_at(&mut root, &path("games/g1/joinRequests/r1"), json!("p1"));
        assert!(old.is_none());
        assert_eq!(
            root,
            json!({
                "games": { "g1": { "joinRequests": { "r1": "p1" } } },
                "chat": { "c1": { "text": "hi" } }
            })
        );

        let old = set_at(&mut root, &path("games/g1/joinRequests/r1"), json!("p2"));
        assert_eq!(old, Some(json!("p1")));
    }

    #[test]
    fn normalize_drops_nulls_and_empty_objects() {
        assert_eq!(
            normalize(json!({ "a": null, "b": {}, "c": { "d": null }, "e": 1 })),
            json!({ "e": 1 })
        );
        assert_eq!(normalize(json!({ "a": null })), Value::Null);
        assert_eq!(normalize(json!([1, null])), json!([1, null]));
    }

    #[test]
    fn empty_object_write_is_a_delete() {
        let mut root = json!({ "games": { "g1": { "status": "Open" } } });
        set_at(&mut root, &path("games/g1"), json!({}));
        assert_eq!(root, json!({}));
    }

    #[test]
    fn root_write_replaces_everything() {
        let mut root = json!({ "games": { "g1": { "status": "Open" } } });
        let old = set_at(&mut root, &StorePath::root(), Value::Null);
        assert!(old.is_some());
        assert_eq!(root, json!({}));
        assert_eq!(get_at(&root, &StorePath::root()), Some(&json!({})));
    }
}
