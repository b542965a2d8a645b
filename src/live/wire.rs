//! Live protocol framing.
//!
//! Server frames are JSON objects with exactly one populated top-level key
//! (`setupComplete`, `toolCall`, `toolCallCancellation`, `serverContent`).
//! Client frames wrap the setup payload or a tool response the same way.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::events::{ToolCall, ToolResponse};
use super::setup::SessionConfig;
use crate::error::{ChartBridgeError, Result};

/// A decoded server frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    SetupComplete,
    ToolCall(ToolCall),
    ToolCallCancellation { ids: Vec<String> },
    ServerContent(Value),
    /// A well-formed frame the bridge has no use for.
    Unknown,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawServerMessage {
    setup_complete: Option<Value>,
    tool_call: Option<ToolCall>,
    tool_call_cancellation: Option<RawCancellation>,
    server_content: Option<Value>,
}

#[derive(Deserialize)]
struct RawCancellation {
    #[serde(default)]
    ids: Vec<String>,
}

impl ServerMessage {
    /// Decode a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ChartBridgeError::Wire`] when the frame is not a JSON object
    /// of the expected shape.
    pub fn decode(frame: &str) -> Result<Self> {
        let raw: RawServerMessage = serde_json::from_str(frame)
            .map_err(|e| ChartBridgeError::Wire(format!("invalid server frame: {e}")))?;

        Ok(if let Some(call) = raw.tool_call {
            Self::ToolCall(call)
        } else if let Some(cancel) = raw.tool_call_cancellation {
            Self::ToolCallCancellation { ids: cancel.ids }
        } else if raw.setup_complete.is_some() {
            Self::SetupComplete
        } else if let Some(content) = raw.server_content {
            Self::ServerContent(content)
        } else {
            Self::Unknown
        })
    }
}

/// A client frame ready to be written to the transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientMessage {
    Setup(SessionConfig),
    ToolResponse(ToolResponse),
}

impl ClientMessage {
    /// Encode as a JSON text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ChartBridgeError::Wire`] if serialization fails.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| ChartBridgeError::Wire(format!("failed to encode client frame: {e}")))
    }
}
