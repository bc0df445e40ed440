//! Route descriptors.

use serde::{Serialize, Serializer};

use crate::routing::template::TemplateError;
use crate::routing::value::Value;

/// Reserved descriptor key holding the matched route.
pub const ROUTE_KEY: &str = "route";

/// A fully bound route: target names, arguments and the matched route key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    route: String,
    value: Value,
    warnings: Vec<TemplateError>,
}

impl RouteDescriptor {
    /// Wrap a bound template value.
    ///
    /// Non-mapping values are lifted into a mapping: a scalar under `scalar`,
    /// a sequence under its indices.
    pub fn new(route: impl Into<String>, value: Value, warnings: Vec<TemplateError>) -> Self {
        let route = route.into();
        let mut value = match value {
            Value::Mapping(entries) => Value::Mapping(entries),
            Value::Sequence(items) => Value::Mapping(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), v))
                    .collect(),
            ),
            Value::Null => Value::Mapping(Vec::new()),
            scalar => Value::Mapping(vec![("scalar".to_string(), scalar)]),
        };
        value.set(ROUTE_KEY, Value::String(route.clone()));

        Self { route, value, warnings }
    }

    /// The route key that produced this descriptor.
    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.value.get(name)
    }

    /// Non-empty string field.
    fn name(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    pub fn controller(&self) -> Option<&str> {
        self.name("controller")
    }

    pub fn action(&self) -> Option<&str> {
        self.name("action")
    }

    pub fn file(&self) -> Option<&str> {
        self.name("file")
    }

    /// Arguments to pass to the action; empty when unset.
    pub fn args(&self) -> &[Value] {
        self.get("args").and_then(Value::as_sequence).unwrap_or(&[])
    }

    /// Replace a field, e.g. the synthetic `args` of an error route.
    pub fn set(&mut self, name: &str, value: Value) {
        self.value.set(name, value);
    }

    /// Problems reported while binding.
    pub fn warnings(&self) -> &[TemplateError] {
        &self.warnings
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}

impl Serialize for RouteDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}
