//! Parsed chart-grammar documents.

use serde_json::Value;

use crate::error::{ChartBridgeError, Result};

/// A parsed chart specification (Vega-Lite style JSON).
///
/// Only JSON well-formedness is checked; grammar errors are left to the
/// renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartDocument {
    value: Value,
}

impl ChartDocument {
    /// Parse a serialized specification.
    ///
    /// # Errors
    ///
    /// Returns [`ChartBridgeError::MalformedSpec`] if `raw` is not valid JSON.
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map(|value| Self { value })
            .map_err(|e| ChartBridgeError::MalformedSpec(format!("chart spec is not valid JSON: {e}")))
    }

    /// The mark type, whether written as `"mark": "bar"` or
    /// `"mark": { "type": "bar" }`.
    pub fn mark(&self) -> Option<&str> {
        match self.value.get("mark")? {
            Value::String(s) => Some(s),
            Value::Object(obj) => obj.get("type").and_then(Value::as_str),
            _ => None,
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}
