//! Demo scenarios.
//!
//! Each scenario wires a `PainlineRuntime` with scripted ASR and recording
//! TTS, runs one workflow end to end through the real estimator, validator,
//! verifier and audit chain, and prints what happened at every step.

pub mod dual_visit;
pub mod guarded_review;
pub mod single_visit;

use std::sync::Arc;

use painline_config::PipelineConfig;
use painline_core::AgentSet;
use painline_guard::SecurityEthicsAgent;
use painline_nlp::PainAssessmentAgent;

use crate::backends::{RecordingTtsAgent, ScriptedAsrAgent};

/// Agents for a scenario: scripted ASR, recording TTS, real pain and guard agents.
pub fn scripted_agents(
    config: &PipelineConfig,
    asr: ScriptedAsrAgent,
    tts: &RecordingTtsAgent,
) -> AgentSet {
    AgentSet {
        asr: Arc::new(asr),
        tts: Arc::new(tts.clone()),
        pain: Arc::new(PainAssessmentAgent::new()),
        guard: Arc::new(SecurityEthicsAgent::new(config.thresholds)),
    }
}
