//! The dotted-expression walker shared by the path resolver and the value resolver.
//!
//! A dotted expression is one or more identifier segments separated by `.`, resolved
//! left-to-right against a JSON value. Resolution never fails: a missing key, an
//! out-of-range index, or traversal through a scalar all collapse to [`Value::Null`],
//! matching the "nullish propagates" rule used throughout the engine.
use serde_json::Value;

static NULL: Value = Value::Null;

/// Walk `path` (e.g. `"event.groupId"`) against `root`, returning a reference to the
/// resolved value or to a shared `Value::Null` if any step is missing or not a container.
pub fn get_dotted<'a>(root: &'a Value, path: &str) -> &'a Value {
    let mut current = root;
    for segment in path.split('.') {
        if segment.is_empty() {
            return &NULL;
        }
        current = match current {
            Value::Object(map) => match map.get(segment) {
                Some(value) => value,
                None => return &NULL,
            },
            Value::Array(items) => match segment.parse::<usize>().ok().and_then(|i| items.get(i)) {
                Some(value) => value,
                None => return &NULL,
            },
            _ => return &NULL,
        };
    }
    current
}

/// Render a resolved value as the string form used for interpolation: strings pass
/// through unquoted, `null` (explicit or resulting from a missing path) becomes the
/// empty string, everything else is its compact JSON text.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn walks_nested_objects() {
        let root = json!({"event": {"groupId": "G1"}});
        assert_eq!(get_dotted(&root, "event.groupId"), &json!("G1"));
    }

    #[test]
    fn walks_array_indices() {
        let root = json!({"event": {"tags": ["a", "b"]}});
        assert_eq!(get_dotted(&root, "event.tags.1"), &json!("b"));
    }

    #[test]
    fn missing_key_is_null() {
        let root = json!({"event": {}});
        assert_eq!(get_dotted(&root, "event.missing"), &Value::Null);
    }

    #[test]
    fn traversal_through_scalar_is_null() {
        let root = json!({"event": "G1"});
        assert_eq!(get_dotted(&root, "event.groupId"), &Value::Null);
    }

    #[test]
    fn stringify_null_is_empty() {
        assert_eq!(stringify(&Value::Null), "");
    }

    #[test]
    fn stringify_number_is_compact_json() {
        assert_eq!(stringify(&json!(42)), "42");
    }

    #[test]
    fn stringify_string_is_unquoted() {
        assert_eq!(stringify(&json!("hello")), "hello");
    }
}
