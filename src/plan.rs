//! Serializable shapes of a Transform Plan: the conditional, variable-driven mutation
//! description accepted by [`crate::Engine::transform`].
//!
//! These types mirror the meta-schema in [`crate::meta_schema`] field for field; the
//! meta-schema is the source of truth for what is *valid*, these types are the source
//! of truth for what is *representable*. A plan that deserializes successfully may
//! still fail meta-schema validation (e.g. a `VariableSpec` with both `get` and `value`
//! deserializes fine into an enum below only because we model it as a loosely-typed
//! struct, not a `serde(untagged)` enum — see the comment on `VariableSpec`).
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The top-level Transform Plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub atomic: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variables: IndexMap<String, VariableSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preconditions: Option<Value>,
    pub when: Vec<Branch>,
}

/// A variable specification: exactly one of `get` or `value`.
///
/// Modeled as a plain struct with two `Option` fields rather than a `serde(untagged)`
/// enum so that a plan with both or neither present still deserializes — the
/// mutual-exclusivity rule is a *validation* concern (enforced by the meta-schema and,
/// defensively, by [`crate::vars::evaluate_one`]), not a parse-time concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// One entry of the ordered `when` sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    #[serde(rename = "if")]
    pub if_: Value,
    pub then: Action,
    #[serde(default, rename = "else", skip_serializing_if = "Option::is_none")]
    pub else_: Option<Action>,
}

/// A branch's chosen action: its own preconditions, variables, and the ops to run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preconditions: Option<Value>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variables: IndexMap<String, VariableSpec>,
    pub ops: Vec<Operation>,
}

/// The kind of primitive (or convenience `set`) operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Add,
    Replace,
    Remove,
    Test,
    Set,
}

impl OpKind {
    /// RFC 6902 primitives this op maps to directly. `Set` is not one of them; it is
    /// reduced to `Add`/`Replace` by [`crate::executor`] based on whether its target
    /// exists.
    pub fn is_primitive(self) -> bool {
        !matches!(self, OpKind::Set)
    }
}

/// How `test` should compare (informational only — see `DESIGN.md` for the recorded
/// open-question decision).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TestKind {
    Equality,
    DeepEqual,
}

/// One operation within an [`Action`], in plan-author form (paths are templates,
/// values are specs, nothing has been resolved against a context yet).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub op: OpKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "testKind")]
    pub test_kind: Option<TestKind>,
}
