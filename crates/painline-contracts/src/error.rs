//! Error taxonomy for the PAINLINE pipeline.
//!
//! All fallible operations return `PainlineResult<T>`. Agent boundaries never
//! let a `PainlineError` escape: `Agent::invoke()` folds it into a failed
//! `AgentResponse` tagged with the matching `FailureKind`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The unified error type for the PAINLINE crates.
#[derive(Debug, Clone, Error)]
pub enum PainlineError {
    /// The request lacks a field the selected operation cannot run without.
    #[error("missing required field '{field}'")]
    MissingRequiredField { field: String },

    /// The request payload could not be decoded into the agent's request type.
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// A collaborator reported `success: false`. `reason` carries its diagnostic.
    #[error("agent '{agent}' failed: {reason}")]
    UpstreamAgentFailure { agent: String, reason: String },

    /// A collaborator answered, but its body does not match the capability contract.
    #[error("agent '{agent}' returned a malformed response: {reason}")]
    MalformedResponse { agent: String, reason: String },

    /// The security/ethics gate blocked the result.
    #[error("validation rejected the result: {reason}")]
    ValidationRejected { reason: String },

    /// The agent did not answer within the caller-supplied deadline.
    #[error("agent '{agent}' timed out after {timeout_ms} ms")]
    Timeout { agent: String, timeout_ms: u64 },

    /// The agent panicked or its worker vanished before answering.
    #[error("agent '{agent}' crashed: {reason}")]
    AgentCrashed { agent: String, reason: String },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// The audit writer could not persist a step record.
    #[error("audit write failed: {reason}")]
    AuditWriteFailed { reason: String },

    /// A result document could not be written to its destination.
    #[error("cannot write '{path}': {reason}")]
    OutputWriteFailed { path: String, reason: String },
}

impl PainlineError {
    /// The serializable discriminant carried on failed agent responses.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::MissingRequiredField { .. } => FailureKind::MissingRequiredField,
            Self::InvalidRequest { .. } => FailureKind::InvalidRequest,
            Self::UpstreamAgentFailure { .. } => FailureKind::UpstreamAgentFailure,
            Self::MalformedResponse { .. } => FailureKind::MalformedResponse,
            Self::ValidationRejected { .. } => FailureKind::ValidationRejected,
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::AgentCrashed { .. } => FailureKind::AgentCrashed,
            Self::ConfigError { .. } => FailureKind::ConfigError,
            Self::AuditWriteFailed { .. } => FailureKind::AuditWriteFailed,
            Self::OutputWriteFailed { .. } => FailureKind::OutputWriteFailed,
        }
    }
}

/// Wire-level discriminant for a failure, mirrored from `PainlineError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    MissingRequiredField,
    InvalidRequest,
    UpstreamAgentFailure,
    MalformedResponse,
    ValidationRejected,
    Timeout,
    AgentCrashed,
    ConfigError,
    AuditWriteFailed,
    OutputWriteFailed,
}

/// Convenience alias used throughout the PAINLINE crates.
pub type PainlineResult<T> = Result<T, PainlineError>;
