//! The Variable Evaluator: turns a mapping of `VariableSpec`s into concrete values,
//! threading each newly-bound variable into the context so later entries in the same
//! mapping may reference earlier ones via `{vars.earlier}`.
use crate::context::Working;
use crate::dotted::get_dotted;
use crate::error::EngineError;
use crate::paths::{pointer_get, to_pointer};
use crate::plan::VariableSpec;
use indexmap::IndexMap;
use serde_json::Value;

/// Evaluate `specs` in iteration order, merging each result into `working.vars`
/// immediately. Calling this twice — once for a plan's top-level `variables`, once for
/// a chosen branch's `variables` — realizes the "branch values merge over and may
/// reference top-level values" rule: the second call's context already contains the
/// first call's bindings.
pub fn evaluate_into(
    specs: &IndexMap<String, VariableSpec>,
    working: &mut Working,
) -> Result<(), EngineError> {
    for (name, spec) in specs {
        let ctx = working.as_value();
        let value = evaluate_one(name, spec, &ctx)?;
        working.vars.insert(name.clone(), value);
    }
    Ok(())
}

fn evaluate_one(name: &str, spec: &VariableSpec, ctx: &Value) -> Result<Value, EngineError> {
    match (&spec.get, &spec.value) {
        (None, Some(value)) => Ok(value.clone()),
        (Some(expr), None) => Ok(evaluate_get(expr, ctx)),
        (Some(_), Some(_)) => Err(EngineError::InvalidPlan {
            errors: vec![format!(
                "variable '{name}' has both `get` and `value`; exactly one is required"
            )],
        }),
        (None, None) => Err(EngineError::InvalidPlan {
            errors: vec![format!(
                "variable '{name}' has neither `get` nor `value`; exactly one is required"
            )],
        }),
    }
}

/// `get: expr` dispatches on whether `expr` looks like a JSON Pointer (leading `/`, a
/// `PathTemplate`) or a dotted expression.
fn evaluate_get(expr: &str, ctx: &Value) -> Value {
    if expr.starts_with('/') {
        let pointer = to_pointer(expr, ctx);
        pointer_get(ctx, &pointer).clone()
    } else {
        get_dotted(ctx, expr).clone()
    }
}
