//! The value type for `with:` mappings, shared between workflow-call jobs
//! and action steps.

use serde_yaml::Value;

/// A value supplied in a `with:` mapping. Unlike `env:`, GitHub Actions
/// preserves the original scalar kind here long enough for the analyzer to
/// perform type-compatibility checks against a callee's declared input type.
#[derive(Debug, Clone, PartialEq)]
pub enum WithValue {
    Boolean(bool),
    Number(f64),
    String(String),
}

impl WithValue {
    pub fn from_yaml(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Boolean(*b)),
            Value::Number(n) => n.as_f64().map(Self::Number),
            Value::String(s) => Some(Self::String(s.clone())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}
