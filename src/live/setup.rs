//! Session configuration handed to the live session at mount time.
//!
//! [`build_session_config`] is a pure function of [`BridgeConfig`]; calling
//! it twice yields equal values. Installing the result is the session's job.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize};

use super::declaration::FunctionDeclaration;
use crate::config::BridgeConfig;

/// Response modality requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    Text,
    Audio,
    Image,
}

/// Full configuration for one live session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub model: String,
    pub generation_config: GenerationConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<SystemInstruction>,
    pub tools: Vec<ToolBinding>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: OutputMode,
    pub response_mime_type: String,
    pub speech_config: SpeechConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechConfig {
    pub voice_config: VoiceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

/// System instruction as a list of text parts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemInstruction {
    pub parts: Vec<TextPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextPart {
    pub text: String,
}

/// One entry of the session's tool set.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolBinding {
    /// Built-in search augmentation; opaque to the bridge.
    GoogleSearch,
    /// Caller-declared functions.
    FunctionDeclarations(Vec<FunctionDeclaration>),
}

impl Serialize for ToolBinding {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Self::GoogleSearch => {
                map.serialize_entry("googleSearch", &serde_json::Map::new())?;
            }
            Self::FunctionDeclarations(decls) => {
                map.serialize_entry("functionDeclarations", decls)?;
            }
        }
        map.end()
    }
}

impl SessionConfig {
    /// All declared functions across every binding.
    pub fn function_declarations(&self) -> impl Iterator<Item = &FunctionDeclaration> {
        self.tools.iter().flat_map(|binding| match binding {
            ToolBinding::FunctionDeclarations(decls) => decls.as_slice(),
            ToolBinding::GoogleSearch => &[][..],
        })
    }
}

/// Build the session configuration for `config`.
pub fn build_session_config(config: &BridgeConfig) -> SessionConfig {
    let mut tools = Vec::with_capacity(2);
    if config.google_search {
        tools.push(ToolBinding::GoogleSearch);
    }
    tools.push(ToolBinding::FunctionDeclarations(vec![
        config.tool.declaration().clone(),
    ]));

    SessionConfig {
        model: config.model.clone(),
        generation_config: GenerationConfig {
            response_modalities: config.response_modality,
            response_mime_type: config.response_mime_type.clone(),
            speech_config: SpeechConfig {
                voice_config: VoiceConfig {
                    prebuilt_voice_config: PrebuiltVoiceConfig {
                        voice_name: config.voice_name.clone(),
                    },
                },
            },
        },
        system_instruction: config.system_instruction.as_ref().map(|text| SystemInstruction {
            parts: vec![TextPart { text: text.clone() }],
        }),
        tools,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::declaration::ChartTool;

    #[test]
    fn builder_is_idempotent() {
        let config = BridgeConfig::default();
        assert_eq!(build_session_config(&config), build_session_config(&config));
    }

    #[test]
    fn default_config_registers_one_function() {
        let built = build_session_config(&BridgeConfig::default());
        let names: Vec<&str> = built.function_declarations().map(|d| d.name()).collect();
        assert_eq!(names, vec!["checkProcedureAlignment"]);
        assert_eq!(built.tools.first(), Some(&ToolBinding::GoogleSearch));
    }

    #[test]
    fn search_binding_can_be_disabled() {
        let config = BridgeConfig {
            google_search: false,
            tool: ChartTool::RenderAltair,
            ..BridgeConfig::default()
        };
        let built = build_session_config(&config);
        assert_eq!(built.tools.len(), 1);
        assert_eq!(
            built.function_declarations().next().map(|d| d.name()),
            Some("render_altair")
        );
    }

    #[test]
    fn serializes_like_setup_payload() {
        let config = BridgeConfig {
            system_instruction: Some("Always render graphs.".to_owned()),
            ..BridgeConfig::default()
        };
        let json = serde_json::to_value(build_session_config(&config)).unwrap();

        assert_eq!(json["model"], "models/gemini-2.0-flash-exp");
        assert_eq!(json["generationConfig"]["responseModalities"], "text");
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(
            json["generationConfig"]["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]
                ["voiceName"],
            "Aoede"
        );
        assert_eq!(
            json["systemInstruction"]["parts"][0]["text"],
            "Always render graphs."
        );
        assert_eq!(json["tools"][0], serde_json::json!({ "googleSearch": {} }));
        assert_eq!(
            json["tools"][1]["functionDeclarations"][0]["name"],
            "checkProcedureAlignment"
        );
    }

    #[test]
    fn system_instruction_omitted_when_unset() {
        let json = serde_json::to_value(build_session_config(&BridgeConfig::default())).unwrap();
        assert!(json.get("systemInstruction").is_none());
    }
}
