//! The PAINLINE orchestrator: the fail-fast pipeline state machine.
//!
//! Every step follows the same order:
//!
//!   State → Request → [Agent::invoke (isolated)] → Verify → Audit → Transition
//!
//! A required step that answers `success: false`, or whose body fails
//! verification, moves the run to `Failed` immediately and no later step is
//! invoked. Synthesis is the only best-effort step. Whatever happens, the
//! caller gets back a well-formed `PipelineResult`.

use std::{collections::BTreeMap, sync::Arc, time::Duration, time::Instant};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use painline_contracts::{
    agent::{AgentRequest, AgentResponse, SessionId},
    capability::{AsrRequest, AsrResponse, CapabilityKind, TtsRequest, TtsResponse},
    error::{FailureKind, PainlineError},
    execution::StepRecord,
    pain::{PainAssessmentRequest, PainAssessmentResponse, PainEstimate},
    pipeline::{
        steps, Comparison, DualVisitOutcome, DualVisitRequest, FailureOutcome, FinalResult,
        PipelineKind, PipelineResult, PipelineState, SingleVisitOutcome, SingleVisitRequest,
        Visit, VisitSummary,
    },
    validation::{ValidationMode, ValidationRequest, ValidationResponse},
    verify::ResponseSchema,
};

use crate::{
    runner::IsolatedRunner,
    traits::{Agent, AuditWriter, Verifier},
};

/// Sentence spoken at the end of a dual-visit run.
pub const DUAL_VISIT_SUMMARY: &str =
    "Dual visit pain assessment complete. Please review the results with your care team.";

/// Output target used by dual-visit runs that do not name one.
pub const DEFAULT_OUTPUT_TARGET: &str = "pain_assessment_output.wav";

/// The spoken single-visit summary for `estimate`.
pub fn single_visit_summary(estimate: &PainEstimate) -> String {
    format!(
        "The estimated arm pain is {:.1} out of ten, which is {}.",
        estimate.score,
        estimate.bucket.label()
    )
}

/// The four collaborators a pipeline sequences.
#[derive(Clone)]
pub struct AgentSet {
    pub asr: Arc<dyn Agent>,
    pub tts: Arc<dyn Agent>,
    pub pain: Arc<dyn Agent>,
    pub guard: Arc<dyn Agent>,
}

impl AgentSet {
    fn for_kind(&self, kind: CapabilityKind) -> &Arc<dyn Agent> {
        match kind {
            CapabilityKind::Asr => &self.asr,
            CapabilityKind::Tts => &self.tts,
            CapabilityKind::PainAssessment => &self.pain,
            CapabilityKind::SecurityEthics => &self.guard,
        }
    }
}

/// Response schemas, one per capability.
#[derive(Debug, Clone)]
pub struct ResponseSchemas {
    pub asr: ResponseSchema,
    pub tts: ResponseSchema,
    pub pain_assessment: ResponseSchema,
    pub security_ethics: ResponseSchema,
}

impl ResponseSchemas {
    fn for_kind(&self, kind: CapabilityKind) -> &ResponseSchema {
        match kind {
            CapabilityKind::Asr => &self.asr,
            CapabilityKind::Tts => &self.tts,
            CapabilityKind::PainAssessment => &self.pain_assessment,
            CapabilityKind::SecurityEthics => &self.security_ethics,
        }
    }
}

/// Tunables that do not change the pipeline topology.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    /// Deadline for each agent invocation. `None` waits indefinitely.
    pub agent_timeout: Option<Duration>,
    /// Fail the run when the validator reports blocking issues.
    pub block_on_rejection: bool,
    pub default_output_target: String,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            agent_timeout: Some(Duration::from_secs(120)),
            block_on_rejection: false,
            default_output_target: DEFAULT_OUTPUT_TARGET.to_string(),
        }
    }
}

/// Why a run stopped.
#[derive(Debug, Clone)]
struct StepFailure {
    step: String,
    kind: FailureKind,
    error: String,
}

impl StepFailure {
    fn new(step: &str, err: &PainlineError) -> Self {
        Self {
            step: step.to_string(),
            kind: err.kind(),
            error: err.to_string(),
        }
    }
}

/// Mutable bookkeeping for one pipeline invocation.
struct Run {
    pipeline: PipelineKind,
    session_id: SessionId,
    state: PipelineState,
    transitions: Vec<PipelineState>,
    steps: BTreeMap<String, AgentResponse>,
    next_step: u64,
    started_at: DateTime<Utc>,
}

impl Run {
    fn start(pipeline: PipelineKind) -> Self {
        Self {
            pipeline,
            session_id: SessionId::new(),
            state: PipelineState::Idle,
            transitions: vec![PipelineState::Idle],
            steps: BTreeMap::new(),
            next_step: 0,
            started_at: Utc::now(),
        }
    }

    fn enter(&mut self, state: PipelineState) {
        debug!(
            session_id = %self.session_id,
            from = ?self.state,
            to = ?state,
            "pipeline transition"
        );
        self.transitions.push(state.clone());
        self.state = state;
    }
}

/// Drives single-visit and dual-visit runs over a fixed `AgentSet`.
///
/// One orchestrator can serve many runs; each run gets its own session id
/// and shares nothing mutable with other runs except the audit writer.
pub struct Orchestrator {
    agents: AgentSet,
    verifier: Box<dyn Verifier>,
    schemas: ResponseSchemas,
    audit: Box<dyn AuditWriter>,
    runner: IsolatedRunner,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(
        agents: AgentSet,
        verifier: Box<dyn Verifier>,
        schemas: ResponseSchemas,
        audit: Box<dyn AuditWriter>,
        settings: OrchestratorSettings,
    ) -> Self {
        let runner = IsolatedRunner::new(settings.agent_timeout);
        Self { agents, verifier, schemas, audit, runner, settings }
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// ASR → Estimate → optional TTS.
    pub fn run_single_visit(&self, request: &SingleVisitRequest) -> PipelineResult {
        let mut run = Run::start(PipelineKind::SingleVisit);
        info!(
            session_id = %run.session_id,
            audio = %request.audio_reference,
            "single-visit pipeline starting"
        );
        let outcome = self.single_visit_steps(&mut run, request);
        self.conclude(run, outcome)
    }

    /// Two ASR passes, per-visit assessment, combined validation, a
    /// redaction re-check, then best-effort TTS.
    pub fn run_dual_visit(&self, request: &DualVisitRequest) -> PipelineResult {
        let mut run = Run::start(PipelineKind::DualVisit);
        info!(
            session_id = %run.session_id,
            first = %request.first_audio_reference,
            second = %request.second_audio_reference,
            "dual-visit pipeline starting"
        );
        let outcome = self.dual_visit_steps(&mut run, request);
        self.conclude(run, outcome)
    }

    // ── Pipelines ────────────────────────────────────────────────────────────

    fn single_visit_steps(
        &self,
        run: &mut Run,
        request: &SingleVisitRequest,
    ) -> Result<FinalResult, StepFailure> {
        run.enter(PipelineState::Asr { visit: None });
        let asr: AsrResponse = self.invoke_step(
            run,
            steps::ASR,
            CapabilityKind::Asr,
            &AsrRequest {
                audio_reference: request.audio_reference.clone(),
                language_code: request.language_code.clone(),
                visit_tag: None,
            },
        )?;

        run.enter(PipelineState::Estimate);
        let assessment: PainAssessmentResponse = self.invoke_step(
            run,
            steps::PAIN_NLP,
            CapabilityKind::PainAssessment,
            &PainAssessmentRequest { transcript: asr.transcript.clone(), visit_tag: None },
        )?;
        let estimate = assessment.estimate();
        let assessment_text = single_visit_summary(&estimate);

        let output_audio = match &request.output_target {
            Some(target) => {
                run.enter(PipelineState::Tts);
                let tts = TtsRequest {
                    text: assessment_text.clone(),
                    output_target: target.clone(),
                    language_code: request.language_code.clone(),
                    voice_identifier: request.voice_identifier.clone(),
                };
                self.synthesize(run, &tts)?.then(|| target.clone())
            }
            None => {
                run.steps.insert(
                    steps::TTS.to_string(),
                    AgentResponse::skipped(self.agents.tts.name(), "No output audio path specified"),
                );
                None
            }
        };

        Ok(FinalResult::SingleVisit(SingleVisitOutcome {
            audio_input: request.audio_reference.clone(),
            transcript: asr.transcript,
            pain_nrs: estimate.score,
            severity: estimate.bucket,
            assessment_text,
            output_audio,
        }))
    }

    fn dual_visit_steps(
        &self,
        run: &mut Run,
        request: &DualVisitRequest,
    ) -> Result<FinalResult, StepFailure> {
        let first_asr = self.transcribe(run, request, Visit::First)?;
        let second_asr = self.transcribe(run, request, Visit::Second)?;

        let first = self.assess(run, &first_asr.transcript, Visit::First)?;
        let second = self.assess(run, &second_asr.transcript, Visit::Second)?;

        // Validate once over both recordings, at the worse of the two scores.
        run.enter(PipelineState::SecurityEthics);
        let combined = format!("{}\n{}", first.transcript, second.transcript);
        let worst = if second.pain_nrs > first.pain_nrs { &second } else { &first };
        let validation: ValidationResponse = self.invoke_step(
            run,
            steps::SECURITY_ETHICS,
            CapabilityKind::SecurityEthics,
            &ValidationRequest {
                mode: ValidationMode::FullPipeline,
                text: Some(combined.clone()),
                pain_score: Some(worst.pain_nrs),
                severity: Some(worst.severity.label().to_string()),
                transcript: Some(combined),
                session_id: Some(run.session_id.to_string()),
            },
        )?;

        let status = validation.overall_status;
        if self.settings.block_on_rejection && status.blocking_issues {
            warn!(session_id = %run.session_id, "validator reported blocking issues");
            return Err(StepFailure::new(
                steps::SECURITY_ETHICS,
                &PainlineError::ValidationRejected {
                    reason: "input security scan reported blocking issues".to_string(),
                },
            ));
        }

        run.enter(PipelineState::TestSecurity);
        self.recheck_redaction(run, &validation)?;

        run.enter(PipelineState::Tts);
        let tts = TtsRequest {
            text: DUAL_VISIT_SUMMARY.to_string(),
            output_target: request
                .output_target
                .clone()
                .unwrap_or_else(|| self.settings.default_output_target.clone()),
            language_code: request.language_code.clone(),
            voice_identifier: request.voice_identifier.clone(),
        };
        let tts_succeeded = self.synthesize(run, &tts)?;

        let comparison = Comparison::between(&first.estimate(), &second.estimate());
        info!(
            session_id = %run.session_id,
            pain_change = comparison.pain_change,
            approved = status.approved,
            requires_review = status.requires_review,
            "dual-visit comparison ready"
        );

        Ok(FinalResult::DualVisit(DualVisitOutcome {
            first_visit: visit_summary(first),
            second_visit: visit_summary(second),
            comparison,
            approved: status.approved,
            requires_review: status.requires_review,
            summary_text: DUAL_VISIT_SUMMARY.to_string(),
            tts_succeeded,
        }))
    }

    // ── Steps ────────────────────────────────────────────────────────────────

    fn transcribe(
        &self,
        run: &mut Run,
        request: &DualVisitRequest,
        visit: Visit,
    ) -> Result<AsrResponse, StepFailure> {
        let audio_reference = match visit {
            Visit::First => &request.first_audio_reference,
            Visit::Second => &request.second_audio_reference,
        };
        run.enter(PipelineState::Asr { visit: Some(visit) });
        self.invoke_step(
            run,
            &steps::asr(visit),
            CapabilityKind::Asr,
            &AsrRequest {
                audio_reference: audio_reference.clone(),
                language_code: request.language_code.clone(),
                visit_tag: Some(visit.tag().to_string()),
            },
        )
    }

    fn assess(
        &self,
        run: &mut Run,
        transcript: &str,
        visit: Visit,
    ) -> Result<PainAssessmentResponse, StepFailure> {
        run.enter(PipelineState::PainAssessment { visit });
        self.invoke_step(
            run,
            &steps::pain_assessment(visit),
            CapabilityKind::PainAssessment,
            &PainAssessmentRequest {
                transcript: transcript.to_string(),
                visit_tag: Some(visit.tag().to_string()),
            },
        )
    }

    /// Re-scan the validator's redacted text; nothing sensitive may survive.
    fn recheck_redaction(
        &self,
        run: &mut Run,
        validation: &ValidationResponse,
    ) -> Result<(), StepFailure> {
        let redacted = validation
            .input_validation
            .as_ref()
            .map(|scan| scan.redacted_text.clone())
            .ok_or_else(|| {
                StepFailure::new(
                    steps::SECURITY_ETHICS,
                    &PainlineError::MalformedResponse {
                        agent: self.agents.guard.name().to_string(),
                        reason: "full pipeline validation returned no input scan".to_string(),
                    },
                )
            })?;

        let recheck: ValidationResponse = self.invoke_step(
            run,
            steps::TEST_SECURITY,
            CapabilityKind::SecurityEthics,
            &ValidationRequest {
                mode: ValidationMode::InputValidation,
                text: Some(redacted),
                session_id: Some(run.session_id.to_string()),
                ..ValidationRequest::default()
            },
        )?;

        let residual = recheck
            .result()
            .issues
            .iter()
            .filter(|issue| issue.is_sensitive_data())
            .count();
        if residual > 0 {
            warn!(session_id = %run.session_id, residual, "redaction left sensitive data behind");
            return Err(StepFailure::new(
                steps::TEST_SECURITY,
                &PainlineError::ValidationRejected {
                    reason: format!("{residual} sensitive-data match(es) survived redaction"),
                },
            ));
        }
        Ok(())
    }

    /// Best-effort synthesis. `Ok(false)` when the engine failed; only an
    /// audit failure stops the run.
    fn synthesize(&self, run: &mut Run, request: &TtsRequest) -> Result<bool, StepFailure> {
        match self.invoke_step::<_, TtsResponse>(run, steps::TTS, CapabilityKind::Tts, request) {
            Ok(resp) => {
                debug!(
                    session_id = %run.session_id,
                    output = %resp.output_target,
                    bytes = resp.byte_size,
                    "speech synthesized"
                );
                Ok(true)
            }
            Err(f) if f.kind == FailureKind::AuditWriteFailed => Err(f),
            Err(f) => {
                warn!(
                    session_id = %run.session_id,
                    error = %f.error,
                    "speech synthesis failed, continuing without audio"
                );
                Ok(false)
            }
        }
    }

    /// Invoke one capability, verify its answer, audit it, and decode it.
    fn invoke_step<Req, Resp>(
        &self,
        run: &mut Run,
        step_name: &str,
        kind: CapabilityKind,
        body: &Req,
    ) -> Result<Resp, StepFailure>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let agent = self.agents.for_kind(kind);
        let request = AgentRequest::typed(kind.as_str(), body)
            .map_err(|e| StepFailure::new(step_name, &e))?;

        let started = Instant::now();
        let response = self.runner.run(Arc::clone(agent), request.clone());
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let record = StepRecord {
            session_id: run.session_id.to_string(),
            step: run.next_step,
            step_name: step_name.to_string(),
            request,
            response: response.clone(),
            elapsed_ms,
            timestamp: Utc::now(),
        };
        run.next_step += 1;
        run.steps.insert(step_name.to_string(), response.clone());
        self.audit.write(&record).map_err(|e| StepFailure::new(step_name, &e))?;

        if !response.success {
            let kind = response.failure_kind().unwrap_or(FailureKind::UpstreamAgentFailure);
            let error = response
                .error
                .clone()
                .unwrap_or_else(|| format!("agent '{}' reported failure", response.agent));
            warn!(
                session_id = %run.session_id,
                step = %step_name,
                agent = %response.agent,
                error = %error,
                "agent step failed"
            );
            return Err(StepFailure { step: step_name.to_string(), kind, error });
        }

        let report = self
            .verifier
            .verify(&response.body, self.schemas.for_kind(kind))
            .map_err(|e| StepFailure::new(step_name, &e))?;
        if !report.passed {
            let summary = report.summary();
            warn!(
                session_id = %run.session_id,
                step = %step_name,
                failures = %summary,
                "response verification failed"
            );
            return Err(StepFailure::new(
                step_name,
                &PainlineError::MalformedResponse { agent: response.agent.clone(), reason: summary },
            ));
        }

        response.parse_body().map_err(|e| StepFailure::new(step_name, &e))
    }

    // ── Terminal states ──────────────────────────────────────────────────────

    fn conclude(&self, mut run: Run, outcome: Result<FinalResult, StepFailure>) -> PipelineResult {
        let final_result = match outcome {
            Ok(result) => {
                run.enter(PipelineState::Done);
                info!(session_id = %run.session_id, "pipeline complete");
                result
            }
            Err(failure) => {
                run.enter(PipelineState::Failed { step: failure.step.clone() });
                warn!(
                    session_id = %run.session_id,
                    step = %failure.step,
                    kind = ?failure.kind,
                    "pipeline failed"
                );
                let details = run.steps.get(&failure.step).cloned().unwrap_or_else(|| AgentResponse {
                    agent: "orchestrator".to_string(),
                    success: false,
                    body: serde_json::Value::Null,
                    error: Some(failure.error.clone()),
                    error_kind: Some(failure.kind),
                });
                FinalResult::Failed(FailureOutcome {
                    failed_step: failure.step,
                    error_kind: failure.kind,
                    error: failure.error,
                    details,
                })
            }
        };

        let session = run.session_id.to_string();
        if let Err(e) = self.audit.finalize(&session) {
            warn!(session_id = %session, error = %e, "audit finalization failed");
        } else {
            debug!(session_id = %session, "audit finalized");
        }

        PipelineResult {
            pipeline: run.pipeline,
            session_id: run.session_id,
            state: run.state,
            transitions: run.transitions,
            steps: run.steps,
            final_result,
            started_at: run.started_at,
            finished_at: Utc::now(),
        }
    }
}

fn visit_summary(assessment: PainAssessmentResponse) -> VisitSummary {
    VisitSummary {
        visit_tag: assessment.visit_tag,
        transcript: assessment.transcript,
        pain_nrs: assessment.pain_nrs,
        severity: assessment.severity,
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
