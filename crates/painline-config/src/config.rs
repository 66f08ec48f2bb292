//! Configuration schema and loading.
//!
//! Every field has a default, so an empty document is a valid configuration.
//! Unknown keys are rejected so that a misspelt setting fails loudly instead
//! of silently falling back to its default.

use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::debug;

use painline_contracts::{
    capability::{DEFAULT_LANGUAGE_CODE, DEFAULT_VOICE},
    error::{PainlineError, PainlineResult},
    pipeline::{DualVisitRequest, SingleVisitRequest},
    validation::Thresholds,
};
use painline_core::{orchestrator::DEFAULT_OUTPUT_TARGET, OrchestratorSettings};

/// Default per-agent deadline, in milliseconds.
pub const DEFAULT_AGENT_TIMEOUT_MS: u64 = 120_000;

/// The `[pipeline]` section.
///
/// ```toml
/// [pipeline]
/// language_code = "en-US"
/// voice_identifier = "en-US-Neural2-F"
/// default_output_target = "pain_assessment_output.wav"
/// agent_timeout_ms = 120000   # 0 waits indefinitely
/// block_on_rejection = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineSection {
    pub language_code: String,
    pub voice_identifier: String,
    /// Output target for dual-visit synthesis when the request names none.
    pub default_output_target: String,
    pub agent_timeout_ms: u64,
    pub block_on_rejection: bool,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            language_code: DEFAULT_LANGUAGE_CODE.to_string(),
            voice_identifier: DEFAULT_VOICE.to_string(),
            default_output_target: DEFAULT_OUTPUT_TARGET.to_string(),
            agent_timeout_ms: DEFAULT_AGENT_TIMEOUT_MS,
            block_on_rejection: false,
        }
    }
}

/// An external process speaking the agent envelope on stdin/stdout.
///
/// ```toml
/// [agents.asr]
/// command = "/usr/local/bin/whisper-agent"
/// args = ["--model", "small"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSpec {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// The `[agents]` section. An absent entry selects the built-in backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentsSection {
    pub asr: Option<CommandSpec>,
    pub tts: Option<CommandSpec>,
}

/// The whole configuration document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub pipeline: PipelineSection,
    pub thresholds: Thresholds,
    pub agents: AgentsSection,
}

impl PipelineConfig {
    /// Parse and validate a TOML document.
    ///
    /// Returns `PainlineError::ConfigError` if the TOML is malformed, names an
    /// unknown key, or holds values `validate` rejects.
    pub fn from_toml_str(s: &str) -> PainlineResult<Self> {
        let config: PipelineConfig = toml::from_str(s).map_err(|e| PainlineError::ConfigError {
            reason: format!("failed to parse pipeline TOML: {e}"),
        })?;
        config.validate()?;
        debug!(
            language = %config.pipeline.language_code,
            timeout_ms = config.pipeline.agent_timeout_ms,
            external_asr = config.agents.asr.is_some(),
            external_tts = config.agents.tts.is_some(),
            "pipeline configuration loaded"
        );
        Ok(config)
    }

    /// Read the file at `path` and parse it with `from_toml_str`.
    pub fn from_file(path: &Path) -> PainlineResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| PainlineError::ConfigError {
            reason: format!("failed to read config file '{}': {e}", path.display()),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Reject values that parse but cannot drive a pipeline.
    pub fn validate(&self) -> PainlineResult<()> {
        let t = &self.thresholds;
        for (name, value) in [("emergency", t.emergency), ("urgent", t.urgent), ("concerning", t.concerning)] {
            if !(0.0..=10.0).contains(&value) {
                return Err(config_error(format!(
                    "threshold '{name}' is {value}, outside the 0-10 scale"
                )));
            }
        }
        if !(t.emergency >= t.urgent && t.urgent >= t.concerning) {
            return Err(config_error(format!(
                "thresholds must satisfy emergency >= urgent >= concerning, got {} / {} / {}",
                t.emergency, t.urgent, t.concerning
            )));
        }

        if self.pipeline.language_code.trim().is_empty() {
            return Err(config_error("pipeline.language_code must not be empty".to_string()));
        }
        if self.pipeline.default_output_target.trim().is_empty() {
            return Err(config_error(
                "pipeline.default_output_target must not be empty".to_string(),
            ));
        }

        for (name, spec) in [("asr", &self.agents.asr), ("tts", &self.agents.tts)] {
            if let Some(spec) = spec {
                if spec.command.trim().is_empty() {
                    return Err(config_error(format!("agents.{name}.command must not be empty")));
                }
            }
        }
        Ok(())
    }

    pub fn agent_timeout(&self) -> Option<Duration> {
        match self.pipeline.agent_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            agent_timeout: self.agent_timeout(),
            block_on_rejection: self.pipeline.block_on_rejection,
            default_output_target: self.pipeline.default_output_target.clone(),
        }
    }

    /// A single-visit request using the configured language and voice.
    pub fn single_visit(
        &self,
        audio_reference: impl Into<String>,
        output_target: Option<String>,
    ) -> SingleVisitRequest {
        SingleVisitRequest {
            language_code: self.pipeline.language_code.clone(),
            voice_identifier: self.pipeline.voice_identifier.clone(),
            output_target,
            ..SingleVisitRequest::new(audio_reference)
        }
    }

    /// A dual-visit request using the configured language and voice.
    pub fn dual_visit(
        &self,
        first: impl Into<String>,
        second: impl Into<String>,
        output_target: Option<String>,
    ) -> DualVisitRequest {
        DualVisitRequest {
            language_code: self.pipeline.language_code.clone(),
            voice_identifier: self.pipeline.voice_identifier.clone(),
            output_target,
            ..DualVisitRequest::new(first, second)
        }
    }
}

fn config_error(reason: String) -> PainlineError {
    PainlineError::ConfigError { reason }
}
