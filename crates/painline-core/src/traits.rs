//! Core trait definitions for the PAINLINE pipeline.
//!
//! These three traits define the pipeline's trust boundary:
//!
//! - `Agent`      : one capability behind the uniform request/response envelope
//! - `AuditWriter`: trusted sink (records every invocation immutably)
//! - `Verifier`   : trusted checker (validates response bodies before use)
//!
//! The orchestrator wires them together. It never calls a capability
//! directly, only through `Agent::invoke()`.

use tracing::warn;

use painline_contracts::{
    agent::{AgentRequest, AgentResponse},
    error::PainlineResult,
    execution::StepRecord,
    verify::{ResponseSchema, VerificationReport},
};

/// A capability exposed as an isolated unit of work.
///
/// Implementations may run in-process, call a network service, or drive a
/// subprocess. The orchestrator cannot tell the difference.
pub trait Agent: Send + Sync {
    /// Stable name used in responses, audit records, and logs.
    fn name(&self) -> &str;

    /// Do the work and return the capability's response body.
    fn handle(&self, request: &AgentRequest) -> PainlineResult<serde_json::Value>;

    /// Run `handle()` and fold any error into a failed `AgentResponse`.
    ///
    /// Errors never cross this boundary. Agents that already speak the
    /// envelope (e.g. subprocess adapters) may override this to pass the
    /// collaborator's own response through.
    fn invoke(&self, request: &AgentRequest) -> AgentResponse {
        match self.handle(request) {
            Ok(body) => AgentResponse::ok(self.name(), body),
            Err(err) => {
                warn!(
                    agent = %self.name(),
                    kind = %request.kind,
                    error = %err,
                    "agent request failed"
                );
                AgentResponse::failure(self.name(), &err)
            }
        }
    }
}

/// The audit writer: the immutable record of a pipeline run.
///
/// Every agent invocation produces exactly one `StepRecord`. A failed write
/// is fatal for the run.
pub trait AuditWriter: Send + Sync {
    /// Append one step record. Records are never modified or deleted.
    fn write(&self, record: &StepRecord) -> PainlineResult<()>;

    /// Mark a session as complete. Called once the run reaches a terminal state.
    fn finalize(&self, session_id: &str) -> PainlineResult<()>;
}

/// The response verifier: the gate between an agent's answer and its use.
pub trait Verifier: Send + Sync {
    /// Verify a response `body` against `schema`.
    ///
    /// Return a report with `passed = false` and populated `failures` if any
    /// rule fails. `Err` is reserved for verifier faults, not rule failures.
    fn verify(&self, body: &serde_json::Value, schema: &ResponseSchema)
        -> PainlineResult<VerificationReport>;
}
