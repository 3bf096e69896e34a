//! Error types.
use std::fmt::{self, Formatter};

/// Which preconditions failed: the plan's top-level ones, or the chosen branch's own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreconditionScope {
    TopLevel,
    Branch,
}

impl fmt::Display for PreconditionScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PreconditionScope::TopLevel => f.write_str("top-level"),
            PreconditionScope::Branch => f.write_str("branch"),
        }
    }
}

/// An error raised while validating or executing a Transform Plan.
#[derive(Debug)]
pub enum EngineError {
    /// The plan failed meta-schema validation. Raised before any context access.
    InvalidPlan { errors: Vec<String> },
    /// A top-level or branch `preconditions` predicate returned false.
    PreconditionFailed { scope: PreconditionScope },
    /// A `set` operation's pointer traverses a non-container value on the parent chain.
    ParentNotObject { path: String, op_index: usize },
    /// The patch applier reported an error on a primitive operation.
    OpFailed { op_index: usize, message: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidPlan { errors } => {
                write!(f, "plan failed validation: {}", errors.join("; "))
            }
            EngineError::PreconditionFailed { scope } => {
                write!(f, "{scope} preconditions were not satisfied")
            }
            EngineError::ParentNotObject { path, op_index } => write!(
                f,
                "op {op_index}: parent of '{path}' exists but is not an object"
            ),
            EngineError::OpFailed { op_index, message } => {
                write!(f, "op {op_index} failed: {message}")
            }
        }
    }
}

impl std::error::Error for EngineError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_plan_joins_errors() {
        let err = EngineError::InvalidPlan {
            errors: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.to_string(), "plan failed validation: a; b");
    }

    #[test]
    fn precondition_failed_names_scope() {
        let err = EngineError::PreconditionFailed {
            scope: PreconditionScope::Branch,
        };
        assert_eq!(err.to_string(), "branch preconditions were not satisfied");
    }
}
