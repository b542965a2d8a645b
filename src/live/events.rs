//! Tool-call invocation records exchanged with the live session.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An invocation event: one or more function calls emitted together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    #[serde(default)]
    pub function_calls: Vec<FunctionCall>,
}

impl ToolCall {
    pub fn new(function_calls: Vec<FunctionCall>) -> Self {
        Self { function_calls }
    }

    /// First call whose name equals `name`.
    pub fn find(&self, name: &str) -> Option<&FunctionCall> {
        self.function_calls.iter().find(|fc| fc.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.function_calls.is_empty()
    }
}

/// A single function invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub args: FunctionArgs,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, id: impl Into<String>, args: FunctionArgs) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            args,
        }
    }
}

/// Why a string argument could not be extracted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MissingFieldError {
    #[error("argument `{key}` is missing")]
    Absent { key: String },

    #[error("argument `{key}` is {found}, expected a string")]
    NotAString { key: String, found: &'static str },
}

/// Untyped invocation arguments.
///
/// Values stay as loosely-typed JSON; callers pull out what they need through
/// the fallible accessors instead of casting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionArgs(Map<String, Value>);

impl FunctionArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Extract a string argument.
    ///
    /// # Errors
    ///
    /// [`MissingFieldError::Absent`] when the key is not present,
    /// [`MissingFieldError::NotAString`] when it holds another kind of value.
    pub fn extract_str(&self, key: &str) -> Result<&str, MissingFieldError> {
        match self.0.get(key) {
            None => Err(MissingFieldError::Absent {
                key: key.to_owned(),
            }),
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(MissingFieldError::NotAString {
                key: key.to_owned(),
                found: value_kind(other),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for FunctionArgs {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Response to one or more function calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    pub function_responses: Vec<FunctionResponse>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub id: String,
    pub response: Value,
}

impl ToolResponse {
    /// Report success for every call in `call`.
    pub fn acknowledge_all(call: &ToolCall) -> Self {
        Self {
            function_responses: call
                .function_calls
                .iter()
                .map(|fc| FunctionResponse {
                    id: fc.id.clone(),
                    response: serde_json::json!({ "output": { "success": true } }),
                })
                .collect(),
        }
    }
}
