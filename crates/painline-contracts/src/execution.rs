//! Per-invocation audit records.
//!
//! The orchestrator writes one `StepRecord` for every agent it invokes,
//! successful or not. Records are appended to the audit log and never
//! modified.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::{AgentRequest, AgentResponse};

/// An immutable record of one agent invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// The pipeline run this invocation belongs to.
    pub session_id: String,
    /// Position of this invocation within the pipeline run, starting at 0.
    pub step: u64,
    /// Step name, as used in `PipelineResult::steps`.
    pub step_name: String,
    /// The request handed to the agent.
    pub request: AgentRequest,
    /// The response the orchestrator accepted or rejected.
    pub response: AgentResponse,
    /// Wall-clock duration of the invocation.
    pub elapsed_ms: u64,
    /// Wall-clock time the record was created (UTC).
    pub timestamp: DateTime<Utc>,
}
