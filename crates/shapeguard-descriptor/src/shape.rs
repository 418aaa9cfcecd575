use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stand-in for argument positions the caller did not supply.
pub static ABSENT: Value = Value::Null;

/// `null` is the only absent value.
#[inline]
pub fn is_absent(value: &Value) -> bool {
    value.is_null()
}

/// Coarse shape of a runtime value, reported in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Absent,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl Shape {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Shape::Absent,
            Value::Bool(_) => Shape::Boolean,
            Value::Number(_) => Shape::Number,
            Value::String(_) => Shape::String,
            Value::Array(_) => Shape::Array,
            Value::Object(_) => Shape::Object,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Absent => "absent",
            Shape::Boolean => "boolean",
            Shape::Number => "number",
            Shape::String => "string",
            Shape::Array => "array",
            Shape::Object => "object",
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
