//! The Predicate Engine Adapter: turns an arbitrary JSON Schema fragment embedded in a
//! plan into a callable predicate over the working context, backed by the `jsonschema`
//! crate so the engine itself never implements schema validation.
use crate::error::EngineError;
use serde_json::Value;
use std::collections::HashMap;

/// A compiled predicate: callable repeatedly, and able to produce diagnostics when it
/// returns `false`.
pub trait Predicate: Send + Sync {
    fn matches(&self, instance: &Value) -> bool;
    fn errors(&self, instance: &Value) -> Vec<String>;
}

/// Compiles schema fragments into [`Predicate`]s. The default implementation wraps the
/// `jsonschema` crate; callers may supply their own via
/// [`crate::options::EngineOptions::with_validator`] as long as it is draft-2020-12
/// capable.
pub trait PredicateEngine: Send + Sync {
    fn compile(&self, schema: &Value) -> Result<Box<dyn Predicate>, EngineError>;
}

struct JsonSchemaPredicate {
    validator: jsonschema::Validator,
}

impl Predicate for JsonSchemaPredicate {
    fn matches(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }

    fn errors(&self, instance: &Value) -> Vec<String> {
        match self.validator.validate(instance) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.map(|error| error.to_string()).collect(),
        }
    }
}

/// The default adapter: draft-2020-12, all errors collected, non-strict (unknown
/// formats ignored rather than rejected).
pub struct DefaultPredicateEngine;

impl PredicateEngine for DefaultPredicateEngine {
    fn compile(&self, schema: &Value) -> Result<Box<dyn Predicate>, EngineError> {
        let validator = jsonschema::options()
            .with_draft(jsonschema::Draft::Draft202012)
            .build(schema)
            .map_err(|error| EngineError::InvalidPlan {
                errors: vec![error.to_string()],
            })?;
        Ok(Box::new(JsonSchemaPredicate { validator }))
    }
}

/// A per-`transform`-call compilation cache, keyed by the identity of the schema
/// `Value` inside the (immutable, borrowed-for-the-call) plan. Not shared across calls,
/// matching the concurrency model's "predicate caches are per-call" rule.
pub struct PredicateCache<'a> {
    engine: &'a dyn PredicateEngine,
    cache: HashMap<*const Value, Box<dyn Predicate>>,
}

impl<'a> PredicateCache<'a> {
    pub fn new(engine: &'a dyn PredicateEngine) -> Self {
        Self {
            engine,
            cache: HashMap::new(),
        }
    }

    pub fn matches(&mut self, schema: &Value, instance: &Value) -> Result<bool, EngineError> {
        Ok(self.get_or_compile(schema)?.matches(instance))
    }

    pub fn errors(&mut self, schema: &Value, instance: &Value) -> Result<Vec<String>, EngineError> {
        Ok(self.get_or_compile(schema)?.errors(instance))
    }

    fn get_or_compile(&mut self, schema: &Value) -> Result<&dyn Predicate, EngineError> {
        let key = schema as *const Value;
        if !self.cache.contains_key(&key) {
            let predicate = self.engine.compile(schema)?;
            self.cache.insert(key, predicate);
        }
        Ok(self.cache.get(&key).expect("just inserted").as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn compiles_and_matches() {
        let engine = DefaultPredicateEngine;
        let mut cache = PredicateCache::new(&engine);
        let schema = json!({"type": "string"});
        assert!(cache.matches(&schema, &json!("hello")).unwrap());
        assert!(!cache.matches(&schema, &json!(42)).unwrap());
    }

    #[test]
    fn errors_are_populated_on_mismatch() {
        let engine = DefaultPredicateEngine;
        let mut cache = PredicateCache::new(&engine);
        let schema = json!({"type": "string"});
        let errors = cache.errors(&schema, &json!(42)).unwrap();
        assert!(!errors.is_empty());
    }

    #[test]
    fn invalid_schema_fragment_is_rejected() {
        let engine = DefaultPredicateEngine;
        let mut cache = PredicateCache::new(&engine);
        let schema = json!({"type": "not-a-real-type"});
        assert!(cache.matches(&schema, &json!(1)).is_err());
    }
}
