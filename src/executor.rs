//! The Plan Executor: the end-to-end pipeline described in the module-level docs of
//! [`crate`] — validate, evaluate top-level variables and preconditions, select a
//! branch, evaluate its variables and preconditions, prepare and apply its operations,
//! rolling back on failure when the plan is atomic.
use crate::context::Working;
use crate::error::{EngineError, PreconditionScope};
use crate::paths::to_pointer;
use crate::plan::{Action, Branch, OpKind, Operation, Plan};
use crate::predicate::PredicateCache;
use crate::value::resolve_value;
use crate::vars::evaluate_into;
use crate::Engine;
use serde_json::{Map, Value};

/// An [`Operation`] with `path`/`from` resolved to concrete pointers and `value`
/// resolved to a concrete JSON value. `op` is left as given, including `set`.
#[derive(Debug, Clone)]
struct PreparedOperation {
    op: OpKind,
    path: Option<String>,
    from: Option<String>,
    value: Option<Value>,
}

/// A fully-resolved RFC 6902 primitive, ready for the patch applier. `set` no longer
/// appears here — by this point it has been reduced to `add` or `replace`.
#[derive(Debug, Clone)]
struct PrimitiveOp {
    op: OpKind,
    path: String,
    from: Option<String>,
    value: Option<Value>,
}

impl PrimitiveOp {
    fn to_json(&self) -> Value {
        let op_name = match self.op {
            OpKind::Add => "add",
            OpKind::Replace => "replace",
            OpKind::Remove => "remove",
            OpKind::Test => "test",
            OpKind::Set => unreachable!("`set` is reduced before a PrimitiveOp is built"),
        };
        let mut obj = Map::with_capacity(4);
        obj.insert("op".to_string(), Value::String(op_name.to_string()));
        obj.insert("path".to_string(), Value::String(self.path.clone()));
        if let Some(from) = &self.from {
            obj.insert("from".to_string(), Value::String(from.clone()));
        }
        if let Some(value) = &self.value {
            obj.insert("value".to_string(), value.clone());
        }
        Value::Object(obj)
    }
}

/// Run the full pipeline of §4.6 against an already-parsed, already-validated `plan`.
///
/// The final `state` — mutated on success, rolled back on atomic failure, or left
/// partially mutated on non-atomic failure — is always returned alongside the
/// `Result`, so a caller holding `&mut Context` can write it back regardless of
/// outcome; nothing about §8's atomicity/non-atomic-partiality properties is only
/// observable on the success path.
#[tracing::instrument(skip_all, fields(atomic = plan.atomic))]
pub(crate) fn run(
    engine: &Engine,
    plan: &Plan,
    event: Value,
    state: Value,
) -> (Value, Result<Vec<Value>, EngineError>) {
    let mut working = Working::new(event, state);
    let mut cache = PredicateCache::new(engine.validator.as_ref());

    if let Err(error) = evaluate_into(&plan.variables, &mut working) {
        return (working.state, Err(error));
    }
    tracing::trace!(count = plan.variables.len(), "top-level variables evaluated");

    if let Some(schema) = &plan.preconditions {
        if let Err(error) = require_match(&mut cache, schema, &working, PreconditionScope::TopLevel) {
            return (working.state, Err(error));
        }
    }

    let chosen = match select_branch(&mut cache, &plan.when, &working) {
        Ok(chosen) => chosen,
        Err(error) => return (working.state, Err(error)),
    };
    let Some(action) = chosen else {
        tracing::debug!("no branch matched and none carried an `else`; no-op");
        return (working.state, Ok(Vec::new()));
    };

    if let Err(error) = evaluate_into(&action.variables, &mut working) {
        return (working.state, Err(error));
    }
    tracing::trace!(count = action.variables.len(), "branch variables evaluated");

    if let Some(schema) = &action.preconditions {
        if let Err(error) = require_match(&mut cache, schema, &working, PreconditionScope::Branch) {
            return (working.state, Err(error));
        }
    }

    let ctx_value = working.as_value();
    let prepared = prepare_ops(&action.ops, &ctx_value);

    // Snapshot before any mutation, regardless of `atomic`: it is not yet known
    // whether a rollback will be needed.
    let snapshot = working.state.clone();

    let primitives = match map_set_ops(prepared, &mut working.state) {
        Ok(primitives) => primitives,
        Err(error) => {
            tracing::warn!(error = %error, "operation preparation failed");
            if plan.atomic {
                working.state = snapshot;
            }
            return (working.state, Err(error));
        }
    };

    match apply_primitives(&mut working.state, &primitives) {
        Ok(applied) => {
            tracing::debug!(op_count = applied.len(), "transform applied");
            (working.state, Ok(applied))
        }
        Err(error) => {
            tracing::warn!(error = %error, "patch application failed");
            if plan.atomic {
                working.state = snapshot;
            }
            (working.state, Err(error))
        }
    }
}

fn require_match(
    cache: &mut PredicateCache,
    schema: &Value,
    working: &Working,
    scope: PreconditionScope,
) -> Result<(), EngineError> {
    let ctx_value = working.as_value();
    if cache.matches(schema, &ctx_value)? {
        Ok(())
    } else {
        Err(EngineError::PreconditionFailed { scope })
    }
}

/// Iterate `branches` in order, returning the first matched (or unconditionally-taken
/// `else`) action, or `None` if the list is exhausted with nothing chosen.
fn select_branch<'p>(
    cache: &mut PredicateCache,
    branches: &'p [Branch],
    working: &Working,
) -> Result<Option<&'p Action>, EngineError> {
    let ctx_value = working.as_value();
    for branch in branches {
        if cache.matches(&branch.if_, &ctx_value)? {
            return Ok(Some(&branch.then));
        }
        if let Some(else_action) = &branch.else_ {
            return Ok(Some(else_action));
        }
    }
    Ok(None)
}

fn prepare_ops(ops: &[Operation], ctx: &Value) -> Vec<PreparedOperation> {
    ops.iter()
        .map(|op| PreparedOperation {
            op: op.op,
            path: op.path.as_deref().map(|template| to_pointer(template, ctx)),
            from: op.from.as_deref().map(|template| to_pointer(template, ctx)),
            value: op.value.as_ref().map(|spec| resolve_value(spec, ctx)),
        })
        .collect()
}

fn map_set_ops(
    prepared: Vec<PreparedOperation>,
    state: &mut Value,
) -> Result<Vec<PrimitiveOp>, EngineError> {
    let mut primitives = Vec::with_capacity(prepared.len());
    for (index, op) in prepared.into_iter().enumerate() {
        let path = op
            .path
            .expect("meta-schema requires `path` on every op except a bare `test`-less shape");
        if op.op == OpKind::Set {
            ensure_parents(state, &path, index)?;
            let target_op = if state.pointer(&path).is_some() {
                OpKind::Replace
            } else {
                OpKind::Add
            };
            primitives.push(PrimitiveOp {
                op: target_op,
                path,
                from: None,
                value: op.value,
            });
        } else {
            primitives.push(PrimitiveOp {
                op: op.op,
                path,
                from: op.from,
                value: op.value,
            });
        }
    }
    Ok(primitives)
}

/// Walk `pointer` parent-by-parent, creating empty objects for missing parents. The
/// only mutation the executor performs outside the patch applier.
fn ensure_parents(state: &mut Value, pointer: &str, op_index: usize) -> Result<(), EngineError> {
    if pointer.is_empty() || pointer == "/" {
        return Ok(());
    }
    let segments: Vec<String> = pointer.split('/').skip(1).map(unescape_segment).collect();
    let mut current = state;
    if segments.len() <= 1 {
        return Ok(());
    }
    for segment in &segments[..segments.len() - 1] {
        current = step_into(current, segment, pointer, op_index)?;
    }
    Ok(())
}

fn step_into<'a>(
    current: &'a mut Value,
    segment: &str,
    full_path: &str,
    op_index: usize,
) -> Result<&'a mut Value, EngineError> {
    match current {
        Value::Object(map) => {
            let entry = map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if entry.is_null() {
                *entry = Value::Object(Map::new());
            }
            if entry.is_object() || entry.is_array() {
                Ok(entry)
            } else {
                Err(EngineError::ParentNotObject {
                    path: full_path.to_string(),
                    op_index,
                })
            }
        }
        Value::Array(items) => {
            let index: usize = segment.parse().map_err(|_| EngineError::ParentNotObject {
                path: full_path.to_string(),
                op_index,
            })?;
            items.get_mut(index).ok_or_else(|| EngineError::ParentNotObject {
                path: full_path.to_string(),
                op_index,
            })
        }
        _ => Err(EngineError::ParentNotObject {
            path: full_path.to_string(),
            op_index,
        }),
    }
}

fn unescape_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// Apply the resolved primitives to `state` in order via the `json-patch` crate. On
/// the first failing operation, the diagnostic names its position; prior operations'
/// effects remain in `state` (the applier itself is non-atomic — see §4.6 step 11).
fn apply_primitives(state: &mut Value, primitives: &[PrimitiveOp]) -> Result<Vec<Value>, EngineError> {
    let ops_json: Vec<Value> = primitives.iter().map(PrimitiveOp::to_json).collect();
    let patch: json_patch::Patch = serde_json::from_value(Value::Array(ops_json.clone()))
        .expect("internally-constructed primitive ops are well-formed RFC 6902 JSON");
    match json_patch::patch(state, &patch) {
        Ok(()) => Ok(ops_json),
        Err(error) => Err(EngineError::OpFailed {
            op_index: error.operation,
            message: error.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ensure_parents_creates_missing_objects() {
        let mut state = json!({});
        ensure_parents(&mut state, "/a/b/c", 0).unwrap();
        assert_eq!(state, json!({"a": {"b": {}}}));
    }

    #[test]
    fn ensure_parents_rejects_non_object_parent() {
        let mut state = json!({"a": 1});
        let err = ensure_parents(&mut state, "/a/b", 0).unwrap_err();
        assert!(matches!(err, EngineError::ParentNotObject { .. }));
    }

    #[test]
    fn ensure_parents_leaves_existing_containers_alone() {
        let mut state = json!({"a": {"b": {"existing": true}}});
        ensure_parents(&mut state, "/a/b/c", 0).unwrap();
        assert_eq!(state, json!({"a": {"b": {"existing": true}}}));
    }

    #[test]
    fn ensure_parents_treats_explicit_null_as_missing() {
        let mut state = json!({"a": null});
        ensure_parents(&mut state, "/a/b", 0).unwrap();
        assert_eq!(state, json!({"a": {}}));
    }

    #[test]
    fn map_set_emits_add_when_target_missing() {
        let mut state = json!({});
        let prepared = vec![PreparedOperation {
            op: OpKind::Set,
            path: Some("/a".to_string()),
            from: None,
            value: Some(json!(1)),
        }];
        let primitives = map_set_ops(prepared, &mut state).unwrap();
        assert_eq!(primitives[0].op, OpKind::Add);
    }

    #[test]
    fn map_set_emits_replace_when_target_exists() {
        let mut state = json!({"a": 0});
        let prepared = vec![PreparedOperation {
            op: OpKind::Set,
            path: Some("/a".to_string()),
            from: None,
            value: Some(json!(1)),
        }];
        let primitives = map_set_ops(prepared, &mut state).unwrap();
        assert_eq!(primitives[0].op, OpKind::Replace);
    }
}
