//! Pipeline entry requests, state machine states, and the aggregated result.
//!
//! A `PipelineResult` is owned by the orchestrator invocation that built it.
//! It always carries every step's raw `AgentResponse` next to the condensed
//! `FinalResult`, whether the run succeeded or stopped at a failed step.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    agent::{AgentResponse, SessionId},
    capability::{DEFAULT_LANGUAGE_CODE, DEFAULT_VOICE},
    error::FailureKind,
    pain::{PainEstimate, SeverityBucket},
};

/// Step names used as keys in `PipelineResult::steps`.
pub mod steps {
    pub const ASR: &str = "asr";
    pub const PAIN_NLP: &str = "pain_nlp";
    pub const SECURITY_ETHICS: &str = "security_ethics";
    pub const TEST_SECURITY: &str = "test_security";
    pub const TTS: &str = "tts";

    use super::Visit;

    /// `asr_first_visit` / `asr_second_visit`.
    pub fn asr(visit: Visit) -> String {
        format!("{ASR}_{}", visit.tag())
    }

    /// `pain_assessment_first_visit` / `pain_assessment_second_visit`.
    pub fn pain_assessment(visit: Visit) -> String {
        format!("pain_assessment_{}", visit.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    SingleVisit,
    DualVisit,
}

/// Which recording of a dual-visit run a step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visit {
    First,
    Second,
}

impl Visit {
    pub fn tag(self) -> &'static str {
        match self {
            Self::First => "first_visit",
            Self::Second => "second_visit",
        }
    }
}

/// States of the orchestrator state machine.
///
/// `Done` and `Failed` are terminal. Every state entered is appended to
/// `PipelineResult::transitions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Asr {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        visit: Option<Visit>,
    },
    Estimate,
    PainAssessment {
        visit: Visit,
    },
    SecurityEthics,
    TestSecurity,
    Tts,
    Done,
    Failed {
        step: String,
    },
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed { .. })
    }
}

/// Entry request for the single-visit workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleVisitRequest {
    pub audio_reference: String,
    pub language_code: String,
    pub voice_identifier: String,
    /// Where to write the spoken summary. `None` skips synthesis.
    pub output_target: Option<String>,
}

impl SingleVisitRequest {
    pub fn new(audio_reference: impl Into<String>) -> Self {
        Self {
            audio_reference: audio_reference.into(),
            language_code: DEFAULT_LANGUAGE_CODE.to_string(),
            voice_identifier: DEFAULT_VOICE.to_string(),
            output_target: None,
        }
    }
}

/// Entry request for the dual-visit workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DualVisitRequest {
    pub first_audio_reference: String,
    pub second_audio_reference: String,
    pub language_code: String,
    pub voice_identifier: String,
    /// Where to write the spoken summary. `None` uses the configured default.
    pub output_target: Option<String>,
}

impl DualVisitRequest {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first_audio_reference: first.into(),
            second_audio_reference: second.into(),
            language_code: DEFAULT_LANGUAGE_CODE.to_string(),
            voice_identifier: DEFAULT_VOICE.to_string(),
            output_target: None,
        }
    }
}

/// Visit-over-visit change between two estimates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub first_score: f64,
    pub second_score: f64,
    /// `second_score - first_score`; positive means the pain got worse.
    pub pain_change: f64,
    pub first_bucket: SeverityBucket,
    pub second_bucket: SeverityBucket,
}

impl Comparison {
    pub fn between(first: &PainEstimate, second: &PainEstimate) -> Self {
        Self {
            first_score: first.score,
            second_score: second.score,
            pain_change: second.score - first.score,
            first_bucket: first.bucket,
            second_bucket: second.bucket,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitSummary {
    pub visit_tag: String,
    pub transcript: String,
    pub pain_nrs: f64,
    pub severity: SeverityBucket,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleVisitOutcome {
    pub audio_input: String,
    pub transcript: String,
    pub pain_nrs: f64,
    pub severity: SeverityBucket,
    /// The sentence handed to speech synthesis.
    pub assessment_text: String,
    pub output_audio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DualVisitOutcome {
    pub first_visit: VisitSummary,
    pub second_visit: VisitSummary,
    pub comparison: Comparison,
    pub approved: bool,
    /// Propagated from the security/ethics overall status.
    pub requires_review: bool,
    pub summary_text: String,
    /// Synthesis is best-effort; `false` here never fails the pipeline.
    pub tts_succeeded: bool,
}

/// Why and where a pipeline stopped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureOutcome {
    pub failed_step: String,
    pub error_kind: FailureKind,
    pub error: String,
    /// The failed step's raw response.
    pub details: AgentResponse,
}

/// Condensed outcome of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FinalResult {
    SingleVisit(SingleVisitOutcome),
    DualVisit(DualVisitOutcome),
    Failed(FailureOutcome),
}

/// Everything one pipeline invocation produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub pipeline: PipelineKind,
    pub session_id: SessionId,
    /// Terminal state: `Done` or `Failed`.
    pub state: PipelineState,
    /// Every state entered, starting with `Idle`.
    pub transitions: Vec<PipelineState>,
    /// Raw response of every attempted step, keyed by step name.
    pub steps: BTreeMap<String, AgentResponse>,
    pub final_result: FinalResult,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl PipelineResult {
    pub fn succeeded(&self) -> bool {
        self.state == PipelineState::Done
    }

    /// The visit comparison of a successful dual-visit run.
    pub fn comparison(&self) -> Option<&Comparison> {
        match &self.final_result {
            FinalResult::DualVisit(outcome) => Some(&outcome.comparison),
            _ => None,
        }
    }

    /// The failure description of a failed run.
    pub fn failure(&self) -> Option<&FailureOutcome> {
        match &self.final_result {
            FinalResult::Failed(outcome) => Some(outcome),
            _ => None,
        }
    }
}
