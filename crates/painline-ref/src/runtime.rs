//! Wiring a complete pipeline from configuration.
//!
//! `PainlineRuntime` owns an `Orchestrator` built from real components: the
//! rule-based pain agent, the security/ethics agent with configured
//! thresholds, `SchemaVerifier` with the standard schemas, and a shared
//! `InMemoryAuditWriter` the caller can inspect after each run.

use std::{sync::Arc, time::Duration};

use tracing::info;

use painline_audit::InMemoryAuditWriter;
use painline_config::{CommandSpec, PipelineConfig};
use painline_contracts::pipeline::{DualVisitRequest, PipelineResult, SingleVisitRequest};
use painline_core::{traits::Agent, AgentSet, CommandAgent, Orchestrator};
use painline_guard::SecurityEthicsAgent;
use painline_nlp::PainAssessmentAgent;
use painline_verify::schemas;

use crate::backends::{SidecarAsrAgent, UnconfiguredTtsAgent};

/// Audit log id used when the caller does not name one.
pub const DEFAULT_LOG_ID: &str = "painline";

/// A command agent that is killed when the configured agent timeout expires.
fn command_agent(name: &str, spec: &CommandSpec, timeout: Option<Duration>) -> Arc<dyn Agent> {
    let agent = CommandAgent::new(name, spec.command.clone(), spec.args.clone());
    Arc::new(match timeout {
        Some(limit) => agent.with_timeout(limit),
        None => agent,
    })
}

/// The agent set a configuration selects.
///
/// ASR is the configured command, else the sidecar reader. TTS is the
/// configured command, else a stand-in that fails every synthesis.
pub fn build_agents(config: &PipelineConfig) -> AgentSet {
    let timeout = config.agent_timeout();
    let asr = match &config.agents.asr {
        Some(spec) => command_agent("external-asr", spec, timeout),
        None => Arc::new(SidecarAsrAgent) as Arc<dyn Agent>,
    };
    let tts = match &config.agents.tts {
        Some(spec) => command_agent("external-tts", spec, timeout),
        None => Arc::new(UnconfiguredTtsAgent) as Arc<dyn Agent>,
    };
    AgentSet {
        asr,
        tts,
        pain: Arc::new(PainAssessmentAgent::new()),
        guard: Arc::new(SecurityEthicsAgent::new(config.thresholds)),
    }
}

pub struct PainlineRuntime {
    config: PipelineConfig,
    orchestrator: Orchestrator,
    audit: InMemoryAuditWriter,
}

impl PainlineRuntime {
    /// A runtime using the agents `config` selects.
    pub fn from_config(config: PipelineConfig) -> Self {
        let agents = build_agents(&config);
        Self::with_agents(config, agents)
    }

    /// A runtime with caller-supplied agents, e.g. scripted ASR for demos.
    pub fn with_agents(config: PipelineConfig, agents: AgentSet) -> Self {
        let audit = InMemoryAuditWriter::new(DEFAULT_LOG_ID);
        let orchestrator = Orchestrator::new(
            agents,
            Box::new(schemas::standard_verifier()),
            schemas::standard(),
            Box::new(audit.clone()),
            config.orchestrator_settings(),
        );
        info!(
            block_on_rejection = config.pipeline.block_on_rejection,
            timeout_ms = config.pipeline.agent_timeout_ms,
            "pipeline runtime ready"
        );
        Self { config, orchestrator, audit }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Handle on the audit log every run appends to.
    pub fn audit(&self) -> &InMemoryAuditWriter {
        &self.audit
    }

    pub fn run_single_visit(&self, request: &SingleVisitRequest) -> PipelineResult {
        self.orchestrator.run_single_visit(request)
    }

    pub fn run_dual_visit(&self, request: &DualVisitRequest) -> PipelineResult {
        self.orchestrator.run_dual_visit(request)
    }

    /// Single visit with the configured language and voice.
    pub fn single_visit(&self, audio: &str, output_target: Option<String>) -> PipelineResult {
        self.run_single_visit(&self.config.single_visit(audio, output_target))
    }

    /// Dual visit with the configured language and voice.
    pub fn dual_visit(&self, first: &str, second: &str, output_target: Option<String>) -> PipelineResult {
        self.run_dual_visit(&self.config.dual_visit(first, second, output_target))
    }
}
