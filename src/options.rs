//! Configuration surface for an [`crate::Engine`], mirroring the builder idiom the
//! underlying JSON Schema validator itself uses (`jsonschema::options().build(..)`).
//! There is exactly one real knob: an alternative [`PredicateEngine`]. No environment
//! variables, no config files — those are out of scope for this crate.
use crate::predicate::{DefaultPredicateEngine, PredicateEngine};
use crate::Engine;
use std::sync::Arc;

/// Builder for an [`Engine`].
///
/// ```rust
/// use transplan::EngineOptions;
///
/// let engine = EngineOptions::new().build();
/// ```
#[derive(Clone)]
pub struct EngineOptions {
    validator: Option<Arc<dyn PredicateEngine>>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self { validator: None }
    }
}

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Substitute the predicate engine used to compile both the meta-schema and every
    /// branch/precondition schema. Must be draft-2020-12 capable.
    pub fn with_validator(mut self, validator: impl PredicateEngine + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Construct the [`Engine`] described by this builder.
    pub fn build(self) -> Engine {
        Engine {
            validator: self
                .validator
                .unwrap_or_else(|| Arc::new(DefaultPredicateEngine)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_build_an_engine() {
        let _engine = EngineOptions::new().build();
    }
}
