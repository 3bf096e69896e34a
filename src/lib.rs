//! A declarative JSON-state transformation engine.
//!
//! The engine accepts a **Transform Plan** — a serializable description of
//! conditional, variable-driven mutations — and a [`Context`] holding an incoming
//! `event` and a mutable `state` document, and produces either a mutated state plus
//! the concrete patch that was applied, or a failure naming the offending operation.
//!
//! ```rust
//! use serde_json::json;
//! use transplan::{Context, Engine};
//!
//! let plan = json!({
//!     "when": [{
//!         "if": { "properties": { "event": { "required": ["add"] } } },
//!         "then": {
//!             "ops": [
//!                 { "op": "set", "path": "/seen/{event.id}", "value": true }
//!             ]
//!         }
//!     }]
//! });
//!
//! let engine = Engine::new();
//! let mut ctx = Context::new(json!({"id": "abc", "add": true}), json!({"seen": {}}));
//! let ops = engine.transform(&plan, &mut ctx).expect("valid plan and context");
//! assert_eq!(ctx.state, json!({"seen": {"abc": true}}));
//! assert_eq!(ops.len(), 1);
//! ```
//!
//! # Configuration
//!
//! [`Engine`] is built via [`EngineOptions`], mirroring the builder idiom of the JSON
//! Schema validator it wraps:
//!
//! ```rust
//! use transplan::EngineOptions;
//!
//! let engine = EngineOptions::new().build();
//! ```
//!
//! # Architecture
//!
//! Six cooperating components, leaves first: the Path Resolver ([`paths`]) and Value
//! Resolver ([`value`]) feed the Variable Evaluator ([`vars`]); the Predicate Engine
//! Adapter ([`predicate`]) wraps the `jsonschema` crate; the Plan Validator
//! ([`meta_schema`]) compiles the bundled meta-schema once per process; and the Plan
//! Executor ([`executor`]) drives the end-to-end pipeline over all of the above.
mod context;
mod dotted;
pub mod error;
mod executor;
pub mod meta_schema;
mod options;
pub mod paths;
pub mod plan;
pub mod predicate;
mod value;
mod vars;

pub use context::Context;
pub use error::EngineError;
pub use options::EngineOptions;
pub use plan::Plan;
pub use predicate::{Predicate, PredicateEngine};

use serde_json::Value;
use std::sync::Arc;

/// The compiled, ready-to-use engine. Cheap to construct (`Engine::new()`); holds only
/// an `Arc`-wrapped predicate engine, so it is `Send + Sync` and safe to share behind
/// an `Arc<Engine>` across worker threads as long as each call gets its own
/// [`Context`].
pub struct Engine {
    pub(crate) validator: Arc<dyn PredicateEngine>,
}

impl Engine {
    /// Build an engine with the default predicate engine (the `jsonschema` crate,
    /// draft-2020-12, all errors collected).
    pub fn new() -> Self {
        EngineOptions::new().build()
    }

    /// Start building a custom-configured engine.
    pub fn options() -> EngineOptions {
        EngineOptions::new()
    }

    /// The bundled Transform Plan meta-schema, exposed verbatim.
    pub fn meta_schema(&self) -> &'static Value {
        meta_schema::meta_schema()
    }

    /// Validate `plan` (raw JSON) against the Transform Plan meta-schema.
    pub fn validate_plan(&self, plan: &Value) -> Result<(), EngineError> {
        meta_schema::validate_plan(plan, Some(self.validator.as_ref()))
    }

    /// Run the full pipeline: validate `plan`, then execute it against `ctx`.
    ///
    /// `ctx.state` is mutated in place. On success it holds the fully-applied state and
    /// the primitive ops actually applied (`set` already reduced to `add`/`replace`,
    /// suitable for audit logs or replay) are returned. On failure the error names the
    /// offending stage, and `ctx.state` reflects either the pre-call snapshot (when
    /// `plan.atomic` is `true`) or whatever prefix of operations applied before the
    /// failure (when `plan.atomic` is `false`) — either way the caller's own `ctx`
    /// always holds the authoritative post-call state, on every outcome.
    pub fn transform(&self, plan: &Value, ctx: &mut Context) -> Result<Vec<Value>, EngineError> {
        self.validate_plan(plan)?;
        let parsed: Plan = serde_json::from_value(plan.clone()).map_err(|error| EngineError::InvalidPlan {
            errors: vec![error.to_string()],
        })?;
        let event = ctx.event.clone();
        let state = std::mem::take(&mut ctx.state);
        let (state, result) = executor::run(self, &parsed, event, state);
        ctx.state = state;
        result
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_invalid_plan_before_touching_context() {
        let engine = Engine::new();
        let plan = json!({});
        let mut ctx = Context::new(json!({}), json!({"untouched": true}));
        let err = engine.transform(&plan, &mut ctx).unwrap_err();
        assert!(matches!(err, EngineError::InvalidPlan { .. }));
        assert_eq!(ctx.state, json!({"untouched": true}));
    }
}
