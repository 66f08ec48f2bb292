//! Agent identity and the uniform request/response envelope.
//!
//! Every capability (ASR, TTS, pain assessment, security/ethics) is reached
//! through the same envelope: an `AgentRequest` goes in, an `AgentResponse`
//! comes out. The orchestrator never sees a capability's internals, only
//! the envelope and the typed body it decodes from it.

use std::fmt;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{FailureKind, PainlineError, PainlineResult};

/// Unique identifier for one pipeline invocation.
///
/// Appears in every audit record, every validator audit entry, and the
/// final `PipelineResult`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub uuid::Uuid);

impl SessionId {
    /// Create a new, unique session ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A request delivered to an agent.
///
/// `kind` names the capability being asked for (e.g. "asr", "tts").
/// `payload` carries the capability's request body as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRequest {
    pub kind: String,
    pub payload: serde_json::Value,
}

impl AgentRequest {
    /// Build a request from a typed body.
    pub fn typed<T: Serialize>(kind: impl Into<String>, body: &T) -> PainlineResult<Self> {
        let payload = serde_json::to_value(body).map_err(|e| PainlineError::InvalidRequest {
            reason: format!("request body is not serializable: {e}"),
        })?;
        Ok(Self { kind: kind.into(), payload })
    }

    /// Decode the payload into the agent's request type.
    pub fn parse<T: DeserializeOwned>(&self) -> PainlineResult<T> {
        serde_json::from_value(self.payload.clone()).map_err(|e| PainlineError::InvalidRequest {
            reason: format!("cannot decode '{}' request: {e}", self.kind),
        })
    }
}

/// The structured answer every agent returns, success or not.
///
/// Failures never cross an agent boundary as panics or errors: they arrive
/// here with `success = false`, a human-readable `error` and an `error_kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    /// Name of the agent that produced this response.
    pub agent: String,
    pub success: bool,
    /// Capability-specific response body. `null` on failure.
    #[serde(default)]
    pub body: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<FailureKind>,
}

impl AgentResponse {
    /// A successful response carrying `body`.
    pub fn ok(agent: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            agent: agent.into(),
            success: true,
            body,
            error: None,
            error_kind: None,
        }
    }

    /// A successful response carrying a typed body.
    ///
    /// A body that fails to serialize becomes a failed response rather than
    /// a panic.
    pub fn from_typed<T: Serialize>(agent: impl Into<String>, body: &T) -> Self {
        let agent = agent.into();
        match serde_json::to_value(body) {
            Ok(value) => Self::ok(agent, value),
            Err(e) => Self::failure(
                agent.clone(),
                &PainlineError::MalformedResponse {
                    agent,
                    reason: format!("response body is not serializable: {e}"),
                },
            ),
        }
    }

    /// A failed response describing `err`.
    pub fn failure(agent: impl Into<String>, err: &PainlineError) -> Self {
        Self {
            agent: agent.into(),
            success: false,
            body: serde_json::Value::Null,
            error: Some(err.to_string()),
            error_kind: Some(err.kind()),
        }
    }

    /// A placeholder for an optional step that was not attempted.
    pub fn skipped(agent: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ok(
            agent,
            serde_json::json!({ "skipped": true, "reason": reason.into() }),
        )
    }

    /// Decode the body into a typed response.
    ///
    /// Returns `MalformedResponse` if the body does not fit `T`.
    pub fn parse_body<T: DeserializeOwned>(&self) -> PainlineResult<T> {
        serde_json::from_value(self.body.clone()).map_err(|e| PainlineError::MalformedResponse {
            agent: self.agent.clone(),
            reason: e.to_string(),
        })
    }

    /// The failure kind of a failed response, defaulting to
    /// `UpstreamAgentFailure` when the agent did not classify it.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        if self.success {
            None
        } else {
            Some(self.error_kind.unwrap_or(FailureKind::UpstreamAgentFailure))
        }
    }
}
