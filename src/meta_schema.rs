//! The bundled Transform Plan meta-schema (draft-2020-12) and the Plan Validator that
//! compiles it. The compiled predicate is cached process-wide behind a
//! [`once_cell::sync::Lazy`] so repeated `validate_plan`/`transform` calls pay the
//! compilation cost once; a caller-supplied validator (via
//! [`crate::options::EngineOptions::with_validator`]) bypasses that cache and compiles
//! fresh against the caller's own engine.
use crate::error::EngineError;
use crate::predicate::{DefaultPredicateEngine, Predicate, PredicateEngine};
use once_cell::sync::Lazy;
use serde_json::Value;

/// The meta-schema text, exposed verbatim for callers who wish to validate plans
/// independently of this crate.
pub const META_SCHEMA_JSON: &str = r#"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "$id": "https://example.com/transplan/plan.schema.json",
  "title": "Transform Plan",
  "type": "object",
  "additionalProperties": false,
  "required": ["when"],
  "properties": {
    "atomic": { "type": "boolean", "default": false },
    "description": { "type": "string" },
    "variables": { "$ref": "#/$defs/variablesMap" },
    "preconditions": { "$ref": "#/$defs/schema" },
    "when": {
      "type": "array",
      "minItems": 1,
      "items": { "$ref": "#/$defs/whenBranch" }
    }
  },
  "$defs": {
    "schema": {
      "description": "An arbitrary JSON Schema fragment; opaque to this meta-schema."
    },
    "valueSpec": {
      "description": "Any JSON value. When an object carrying `valueFrom` or `literal`, exactly one of the two must be present.",
      "if": {
        "type": "object",
        "anyOf": [ { "required": ["valueFrom"] }, { "required": ["literal"] } ]
      },
      "then": {
        "oneOf": [
          { "required": ["valueFrom"], "not": { "required": ["literal"] } },
          { "required": ["literal"], "not": { "required": ["valueFrom"] } }
        ]
      }
    },
    "variableSpec": {
      "type": "object",
      "additionalProperties": false,
      "properties": {
        "get": { "type": "string" },
        "value": {}
      },
      "oneOf": [
        { "required": ["get"] },
        { "required": ["value"] }
      ]
    },
    "variablesMap": {
      "type": "object",
      "additionalProperties": { "$ref": "#/$defs/variableSpec" }
    },
    "whenBranch": {
      "type": "object",
      "additionalProperties": false,
      "required": ["if", "then"],
      "properties": {
        "if": { "$ref": "#/$defs/schema" },
        "then": { "$ref": "#/$defs/action" },
        "else": { "$ref": "#/$defs/action" }
      }
    },
    "action": {
      "type": "object",
      "additionalProperties": false,
      "required": ["ops"],
      "properties": {
        "preconditions": { "$ref": "#/$defs/schema" },
        "variables": { "$ref": "#/$defs/variablesMap" },
        "ops": {
          "type": "array",
          "items": { "$ref": "#/$defs/operation" }
        }
      }
    },
    "operation": {
      "type": "object",
      "additionalProperties": false,
      "required": ["op"],
      "properties": {
        "op": { "enum": ["add", "replace", "remove", "test", "set"] },
        "path": { "type": "string" },
        "from": { "type": "string" },
        "value": { "$ref": "#/$defs/valueSpec" },
        "testKind": { "enum": ["equality", "deepEqual"] }
      },
      "allOf": [
        {
          "if": {
            "properties": { "op": { "const": "remove" } },
            "required": ["op"]
          },
          "then": {
            "required": ["path"],
            "not": { "required": ["value"] }
          }
        },
        {
          "if": {
            "properties": { "op": { "enum": ["add", "replace", "test", "set"] } },
            "required": ["op"]
          },
          "then": { "required": ["path", "value"] }
        }
      ]
    }
  }
}"#;

static META_SCHEMA_VALUE: Lazy<Value> =
    Lazy::new(|| serde_json::from_str(META_SCHEMA_JSON).expect("bundled meta-schema is valid JSON"));

static COMPILED_META_SCHEMA: Lazy<Box<dyn Predicate>> = Lazy::new(|| {
    DefaultPredicateEngine
        .compile(&META_SCHEMA_VALUE)
        .expect("bundled meta-schema compiles against the default predicate engine")
});

/// The meta-schema as a parsed `Value`, for callers who want to validate plans
/// themselves.
pub fn meta_schema() -> &'static Value {
    &META_SCHEMA_VALUE
}

/// Validate `plan` (already parsed as JSON) against the bundled meta-schema, or against
/// `engine`'s compilation of it if one is supplied.
pub fn validate_plan(plan: &Value, engine: Option<&dyn PredicateEngine>) -> Result<(), EngineError> {
    match engine {
        Some(custom) => {
            let predicate = custom.compile(&META_SCHEMA_VALUE)?;
            check(predicate.as_ref(), plan)
        }
        None => check(COMPILED_META_SCHEMA.as_ref(), plan),
    }
}

fn check(predicate: &dyn Predicate, plan: &Value) -> Result<(), EngineError> {
    if predicate.matches(plan) {
        Ok(())
    } else {
        Err(EngineError::InvalidPlan {
            errors: predicate.errors(plan),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn meta_schema_parses() {
        assert!(meta_schema().is_object());
    }

    #[test]
    fn rejects_plan_without_when() {
        let plan = json!({});
        assert!(validate_plan(&plan, None).is_err());
    }

    #[test]
    fn rejects_unknown_top_level_key() {
        let plan = json!({"when": [{"if": true, "then": {"ops": []}}], "bogus": 1});
        assert!(validate_plan(&plan, None).is_err());
    }

    #[test]
    fn rejects_remove_with_value() {
        let plan = json!({
            "when": [{
                "if": true,
                "then": {"ops": [{"op": "remove", "path": "/a", "value": 1}]}
            }]
        });
        assert!(validate_plan(&plan, None).is_err());
    }

    #[test]
    fn rejects_add_without_value() {
        let plan = json!({
            "when": [{
                "if": true,
                "then": {"ops": [{"op": "add", "path": "/a"}]}
            }]
        });
        assert!(validate_plan(&plan, None).is_err());
    }

    #[test]
    fn rejects_variable_with_both_get_and_value() {
        let plan = json!({
            "variables": {"x": {"get": "event.a", "value": 1}},
            "when": [{"if": true, "then": {"ops": []}}]
        });
        assert!(validate_plan(&plan, None).is_err());
    }

    #[test]
    fn accepts_minimal_valid_plan() {
        let plan = json!({
            "when": [{"if": true, "then": {"ops": []}}]
        });
        assert!(validate_plan(&plan, None).is_ok());
    }

    #[test]
    fn accepts_full_shaped_plan() {
        let plan = json!({
            "atomic": true,
            "description": "toggle example",
            "variables": {"groupId": {"value": "G1"}},
            "preconditions": {"type": "object"},
            "when": [{
                "if": {"properties": {"event": {"properties": {"add": {"const": true}}}}},
                "then": {
                    "variables": {"itemId": {"get": "event.itemId"}},
                    "ops": [
                        {"op": "set", "path": "/index/byGroup/{vars.groupId}", "value": {"valueFrom": "vars.itemId"}}
                    ]
                },
                "else": {"ops": [{"op": "remove", "path": "/index/byGroup/{vars.groupId}"}]}
            }]
        });
        assert!(validate_plan(&plan, None).is_ok());
    }
}
