use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use shapeguard_descriptor::{predicate, Predicate, PredicateResolver};

/// Name/predicate table. Registries are configured values; build one per
/// engine instead of mutating a process-wide table.
#[derive(Clone, Default)]
pub struct ShapeRegistry {
    entries: BTreeMap<String, Predicate>,
}

impl ShapeRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry preloaded with the JSON shape checks. Each check is available
    /// under a bare name (`number`) and an `is`-prefixed alias (`isNumber`).
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("any", |_| true);
        registry.register_aliased("boolean", "isBoolean", Value::is_boolean);
        registry.register_aliased("number", "isNumber", Value::is_number);
        registry.register_aliased("integer", "isInteger", is_integer);
        registry.register_aliased("string", "isString", Value::is_string);
        registry.register_aliased("array", "isArray", Value::is_array);
        registry.register_aliased("object", "isObject", Value::is_object);
        registry
    }

    /// Add or replace the predicate stored under `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, check: F) -> &mut Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.entries.insert(name.into(), predicate(check));
        self
    }

    fn register_aliased<F>(&mut self, name: &str, alias: &str, check: F)
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let shared = predicate(check);
        self.entries.insert(name.to_string(), shared.clone());
        self.entries.insert(alias.to_string(), shared);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PredicateResolver for ShapeRegistry {
    fn resolve(&self, name: &str) -> Option<Predicate> {
        self.entries.get(name).cloned()
    }

    fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

impl fmt::Debug for ShapeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeRegistry")
            .field("names", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
        }
        _ => false,
    }
}
