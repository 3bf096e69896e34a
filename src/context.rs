//! The caller-owned [`Context`] and the engine's working view over it.
use indexmap::IndexMap;
use serde_json::{Map, Value};

/// The caller's input to a single `transform` call: an observed `event` and the
/// mutable `state` document the plan operates on.
///
/// `state` is mutated in place on success (or restored from a snapshot on atomic
/// rollback, see [`crate::executor`]); `event` is read-only throughout.
#[derive(Debug, Clone)]
pub struct Context {
    pub event: Value,
    pub state: Value,
}

impl Context {
    pub fn new(event: Value, state: Value) -> Self {
        Self { event, state }
    }
}

/// The working context `{event, state, vars}` the rest of the pipeline evaluates
/// predicates and expressions against. Rebuilt (cheaply — `vars` is the only thing
/// that actually changes shape) every time `vars` is updated, since predicate
/// compilation and dotted-path walking both expect a single rooted JSON value.
#[derive(Debug, Clone)]
pub struct Working {
    pub event: Value,
    pub state: Value,
    pub vars: IndexMap<String, Value>,
}

impl Working {
    pub fn new(event: Value, state: Value) -> Self {
        Self {
            event,
            state,
            vars: IndexMap::new(),
        }
    }

    /// Merge `incoming` over the current `vars`, the branch-variable-precedence rule:
    /// same name, later value wins.
    pub fn merge_vars(&mut self, incoming: IndexMap<String, Value>) {
        for (name, value) in incoming {
            self.vars.insert(name, value);
        }
    }

    /// Materialize `{event, state, vars}` as a single `serde_json::Value`, the root
    /// that predicates, dotted expressions, and pointer-form `get` are all evaluated
    /// against.
    pub fn as_value(&self) -> Value {
        let mut vars_map = Map::with_capacity(self.vars.len());
        for (name, value) in &self.vars {
            vars_map.insert(name.clone(), value.clone());
        }
        let mut root = Map::with_capacity(3);
        root.insert("event".to_string(), self.event.clone());
        root.insert("state".to_string(), self.state.clone());
        root.insert("vars".to_string(), Value::Object(vars_map));
        Value::Object(root)
    }
}
