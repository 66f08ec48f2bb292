//! Capability identities and the typed bodies of the external collaborators.
//!
//! ASR and TTS engines are black boxes: PAINLINE only specifies what goes
//! in and what must come back. Retrying across engines, credentials and
//! audio formats are the collaborator's own business.

use serde::{Deserialize, Serialize};

/// Language used when a request does not name one.
pub const DEFAULT_LANGUAGE_CODE: &str = "en-US";

/// Voice used when a synthesis request does not name one.
pub const DEFAULT_VOICE: &str = "en-US-Neural2-F";

/// The four capabilities the orchestrator knows how to sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    Asr,
    Tts,
    PainAssessment,
    SecurityEthics,
}

impl CapabilityKind {
    /// The `AgentRequest::kind` string for this capability.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asr => "asr",
            Self::Tts => "tts",
            Self::PainAssessment => "pain_assessment",
            Self::SecurityEthics => "security_ethics",
        }
    }
}

fn default_language() -> String {
    DEFAULT_LANGUAGE_CODE.to_string()
}

fn default_voice() -> String {
    DEFAULT_VOICE.to_string()
}

/// Speech-to-text request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsrRequest {
    /// Opaque reference to the audio resource (a path, URI, or key).
    pub audio_reference: String,
    #[serde(default = "default_language")]
    pub language_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visit_tag: Option<String>,
}

/// Speech-to-text response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsrResponse {
    pub transcript: String,
    #[serde(default)]
    pub audio_reference: String,
    #[serde(default = "default_language")]
    pub language_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visit_tag: Option<String>,
}

/// Text-to-speech request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtsRequest {
    pub text: String,
    /// Where the synthesized audio should be written.
    pub output_target: String,
    #[serde(default = "default_language")]
    pub language_code: String,
    #[serde(default = "default_voice")]
    pub voice_identifier: String,
}

/// Text-to-speech response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtsResponse {
    pub output_target: String,
    #[serde(default)]
    pub byte_size: u64,
}
