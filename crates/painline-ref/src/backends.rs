//! Built-in ASR and TTS backends.
//!
//! Real speech engines plug in through `CommandAgent`. These backends cover
//! the cases where none is configured: a sidecar transcript file next to the
//! audio, a scripted table for demos and tests, and a TTS stand-in that
//! reports it has no engine so synthesis fails without failing the run.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use serde_json::Value;
use tracing::debug;

use painline_contracts::{
    agent::AgentRequest,
    capability::{AsrRequest, AsrResponse, TtsRequest, TtsResponse},
    error::{PainlineError, PainlineResult},
};
use painline_core::traits::Agent;

fn upstream(agent: &str, reason: String) -> PainlineError {
    PainlineError::UpstreamAgentFailure {
        agent: agent.to_string(),
        reason,
    }
}

fn to_body<T: serde::Serialize>(agent: &str, body: &T) -> PainlineResult<Value> {
    serde_json::to_value(body).map_err(|e| PainlineError::MalformedResponse {
        agent: agent.to_string(),
        reason: e.to_string(),
    })
}

fn asr_body(agent: &str, request: AsrRequest, transcript: String) -> PainlineResult<Value> {
    to_body(
        agent,
        &AsrResponse {
            transcript,
            audio_reference: request.audio_reference,
            language_code: request.language_code,
            visit_tag: request.visit_tag,
        },
    )
}

// ── Sidecar ASR ───────────────────────────────────────────────────────────────

/// Reads the transcript of `visit.wav` from `visit.wav.txt`.
///
/// A reference that already ends in `.txt` is read as the transcript itself.
#[derive(Debug, Clone, Default)]
pub struct SidecarAsrAgent;

impl SidecarAsrAgent {
    pub const NAME: &'static str = "sidecar-asr";

    pub fn sidecar_path(audio_reference: &str) -> PathBuf {
        let path = Path::new(audio_reference);
        if path.extension().is_some_and(|ext| ext == "txt") {
            path.to_path_buf()
        } else {
            PathBuf::from(format!("{audio_reference}.txt"))
        }
    }
}

impl Agent for SidecarAsrAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn handle(&self, request: &AgentRequest) -> PainlineResult<Value> {
        let body: AsrRequest = request.parse()?;
        let path = Self::sidecar_path(&body.audio_reference);
        debug!(path = %path.display(), "reading sidecar transcript");

        let transcript = std::fs::read_to_string(&path).map_err(|e| {
            upstream(
                Self::NAME,
                format!("no transcript for '{}' at '{}': {e}", body.audio_reference, path.display()),
            )
        })?;
        asr_body(Self::NAME, body, transcript.trim().to_string())
    }
}

// ── Scripted ASR ──────────────────────────────────────────────────────────────

/// Answers from a fixed audio-reference → transcript table.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAsrAgent {
    transcripts: HashMap<String, String>,
}

impl ScriptedAsrAgent {
    pub const NAME: &'static str = "scripted-asr";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, audio_reference: impl Into<String>, transcript: impl Into<String>) -> Self {
        self.transcripts.insert(audio_reference.into(), transcript.into());
        self
    }
}

impl Agent for ScriptedAsrAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn handle(&self, request: &AgentRequest) -> PainlineResult<Value> {
        let body: AsrRequest = request.parse()?;
        let transcript = self
            .transcripts
            .get(&body.audio_reference)
            .cloned()
            .ok_or_else(|| {
                upstream(Self::NAME, format!("audio '{}' could not be transcribed", body.audio_reference))
            })?;
        asr_body(Self::NAME, body, transcript)
    }
}

// ── TTS ───────────────────────────────────────────────────────────────────────

/// Stand-in used when no synthesis engine is configured. Always fails.
#[derive(Debug, Clone, Default)]
pub struct UnconfiguredTtsAgent;

impl UnconfiguredTtsAgent {
    pub const NAME: &'static str = "unconfigured-tts";
}

impl Agent for UnconfiguredTtsAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn handle(&self, request: &AgentRequest) -> PainlineResult<Value> {
        let body: TtsRequest = request.parse()?;
        Err(upstream(
            Self::NAME,
            format!(
                "no speech synthesis engine configured; '{}' was not written",
                body.output_target
            ),
        ))
    }
}

/// Records every synthesis request instead of producing audio.
///
/// Reports one byte per character of text as the output size. Clones share
/// the request log.
#[derive(Debug, Clone, Default)]
pub struct RecordingTtsAgent {
    requests: Arc<Mutex<Vec<TtsRequest>>>,
}

impl RecordingTtsAgent {
    pub const NAME: &'static str = "recording-tts";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<TtsRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Agent for RecordingTtsAgent {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn handle(&self, request: &AgentRequest) -> PainlineResult<Value> {
        let body: TtsRequest = request.parse()?;
        let response = TtsResponse {
            output_target: body.output_target.clone(),
            byte_size: body.text.len() as u64,
        };
        self.requests
            .lock()
            .map_err(|_| upstream(Self::NAME, "request log lock poisoned".to_string()))?
            .push(body);
        to_body(Self::NAME, &response)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use painline_contracts::error::FailureKind;

    use super::*;

    fn asr_request(audio: &str) -> AgentRequest {
        AgentRequest {
            kind: "asr".to_string(),
            payload: json!({ "audio_reference": audio, "visit_tag": "first_visit" }),
        }
    }

    fn tts_request(text: &str) -> AgentRequest {
        AgentRequest {
            kind: "tts".to_string(),
            payload: json!({ "text": text, "output_target": "out.wav" }),
        }
    }

    #[test]
    fn sidecar_path_appends_txt() {
        assert_eq!(SidecarAsrAgent::sidecar_path("a/visit.wav"), PathBuf::from("a/visit.wav.txt"));
        assert_eq!(SidecarAsrAgent::sidecar_path("notes.txt"), PathBuf::from("notes.txt"));
    }

    #[test]
    fn sidecar_reads_trimmed_transcript() {
        let audio = std::env::temp_dir().join(format!("painline-sidecar-{}.wav", std::process::id()));
        let audio = audio.to_string_lossy().to_string();
        let sidecar = SidecarAsrAgent::sidecar_path(&audio);
        std::fs::write(&sidecar, "  My arm hurts, 5 out of 10.\n").unwrap();

        let response = SidecarAsrAgent.invoke(&asr_request(&audio));
        std::fs::remove_file(&sidecar).unwrap();

        assert!(response.success, "{:?}", response.error);
        let body: AsrResponse = response.parse_body().unwrap();
        assert_eq!(body.transcript, "My arm hurts, 5 out of 10.");
        assert_eq!(body.audio_reference, audio);
        assert_eq!(body.language_code, "en-US");
        assert_eq!(body.visit_tag.as_deref(), Some("first_visit"));
    }

    #[test]
    fn sidecar_missing_file_is_upstream_failure() {
        let response = SidecarAsrAgent.invoke(&asr_request("/nonexistent/painline/visit.wav"));
        assert!(!response.success);
        assert_eq!(response.failure_kind(), Some(FailureKind::UpstreamAgentFailure));
        assert!(response.error.unwrap().contains("visit.wav.txt"));
    }

    #[test]
    fn scripted_asr_answers_known_audio_only() {
        let agent = ScriptedAsrAgent::new().with("v1.wav", "it aches");

        let ok = agent.invoke(&asr_request("v1.wav"));
        assert_eq!(ok.body["transcript"], "it aches");

        let unknown = agent.invoke(&asr_request("v2.wav"));
        assert!(!unknown.success);
        assert!(unknown.error.unwrap().contains("v2.wav"));
    }

    #[test]
    fn unconfigured_tts_always_fails() {
        let response = UnconfiguredTtsAgent.invoke(&tts_request("hello"));
        assert!(!response.success);
        assert_eq!(response.failure_kind(), Some(FailureKind::UpstreamAgentFailure));
        assert!(response.error.unwrap().contains("out.wav"));
    }

    #[test]
    fn recording_tts_keeps_requests_across_clones() {
        let agent = RecordingTtsAgent::new();
        let handle = agent.clone();

        let response = agent.invoke(&tts_request("twelve chars"));
        assert_eq!(response.body, json!({ "output_target": "out.wav", "byte_size": 12 }));

        let seen = handle.requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].text, "twelve chars");
        assert_eq!(seen[0].voice_identifier, "en-US-Neural2-F");
    }
}
