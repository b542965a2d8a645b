//! Configuration for the live chart bridge.

use serde::{Deserialize, Serialize};

use crate::live::declaration::{CHART_FIELD, ChartTool};
use crate::live::setup::OutputMode;

/// Top-level bridge configuration.
///
/// Every field has a default, so a partial TOML file only overrides what it
/// names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Model identifier handed to the session.
    pub model: String,
    /// Output modality the model responds with.
    pub response_modality: OutputMode,
    /// MIME type for structured responses.
    pub response_mime_type: String,
    /// Prebuilt voice name used when the modality is audio.
    pub voice_name: String,
    /// Enable the built-in search augmentation tool.
    pub google_search: bool,
    /// Optional system instruction text.
    pub system_instruction: Option<String>,
    /// Which callable to register.
    pub tool: ChartTool,
    /// Argument key carrying the chart specification.
    pub chart_field: String,
    /// Tool-call acknowledgement behaviour.
    pub acknowledge: AcknowledgeConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            model: "models/gemini-2.0-flash-exp".to_owned(),
            response_modality: OutputMode::Text,
            response_mime_type: "application/json".to_owned(),
            voice_name: "Aoede".to_owned(),
            google_search: true,
            system_instruction: None,
            tool: ChartTool::default(),
            chart_field: CHART_FIELD.to_owned(),
            acknowledge: AcknowledgeConfig::default(),
        }
    }
}

/// Whether and when tool calls are answered.
///
/// Disabled by default: the bridge only consumes invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcknowledgeConfig {
    pub enabled: bool,
    /// Delay before the response is sent, in milliseconds.
    pub delay_ms: u64,
}

impl Default for AcknowledgeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            delay_ms: 200,
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ChartBridgeError::Config`](crate::error::ChartBridgeError::Config)
    /// on malformed TOML.
    pub fn from_toml(content: &str) -> crate::error::Result<Self> {
        toml::from_str(content).map_err(|e| crate::error::ChartBridgeError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::ChartBridgeError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
