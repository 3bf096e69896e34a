//! Resolving a `ValueSpec` into a concrete JSON value.
use crate::dotted::get_dotted;
use serde_json::Value;

/// Resolve a `ValueSpec` against the working context (`{event, state, vars}`).
///
/// - `{"valueFrom": "<dotted expr>"}` looks the expression up against `ctx` (nullish on
///   any missing step, same as interpolation tokens).
/// - `{"literal": <any>}` returns the inner value verbatim, with no further resolution.
/// - Anything else (scalars, arrays, or objects that are neither of the two shapes
///   above) passes through unchanged.
///
/// `valueFrom` is dotted-expression-only; pointer syntax (`/a/b`) is not recognized
/// here, unlike variable `get`.
pub fn resolve_value(spec: &Value, ctx: &Value) -> Value {
    if let Value::Object(map) = spec {
        if let Some(Value::String(expr)) = map.get("valueFrom") {
            if map.len() == 1 {
                return get_dotted(ctx, expr).clone();
            }
        }
        if map.contains_key("literal") && map.len() == 1 {
            return map["literal"].clone();
        }
    }
    spec.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn value_from_resolves_dotted_expression() {
        let ctx = json!({"event": {"itemId": "I1"}});
        let spec = json!({"valueFrom": "event.itemId"});
        assert_eq!(resolve_value(&spec, &ctx), json!("I1"));
    }

    #[test]
    fn literal_passes_through_verbatim() {
        let ctx = json!({});
        let spec = json!({"literal": {"valueFrom": "not evaluated"}});
        assert_eq!(resolve_value(&spec, &ctx), json!({"valueFrom": "not evaluated"}));
    }

    #[test]
    fn plain_scalar_passes_through() {
        let ctx = json!({});
        assert_eq!(resolve_value(&json!(42), &ctx), json!(42));
        assert_eq!(resolve_value(&json!("I1"), &ctx), json!("I1"));
        assert_eq!(resolve_value(&json!([1, 2]), &ctx), json!([1, 2]));
    }

    #[test]
    fn plain_object_without_recognized_key_passes_through() {
        let ctx = json!({});
        let spec = json!({"foo": "bar"});
        assert_eq!(resolve_value(&spec, &ctx), spec);
    }

    #[test]
    fn value_from_missing_path_is_null() {
        let ctx = json!({"event": {}});
        let spec = json!({"valueFrom": "event.missing"});
        assert_eq!(resolve_value(&spec, &ctx), Value::Null);
    }
}
