//! Subprocess agents.
//!
//! `CommandAgent` hands the request envelope to an external program as JSON
//! on stdin and reads the answer from stdout. Programs may answer with a
//! full `AgentResponse` envelope or with a flat object carrying `success`
//! (and `error`) next to the body fields.
//!
//! With a deadline set, a process still running when it expires is killed
//! and the call fails with `Timeout`.

use std::{
    io::{Read, Write},
    process::{Child, Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

use serde_json::Value;
use tracing::{debug, warn};

use painline_contracts::{
    agent::{AgentRequest, AgentResponse},
    error::{PainlineError, PainlineResult},
};

use crate::traits::Agent;

/// An agent backed by an external command.
#[derive(Debug, Clone)]
pub struct CommandAgent {
    name: String,
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

/// How often a running process is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

impl CommandAgent {
    pub fn new(name: impl Into<String>, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args,
            timeout: None,
        }
    }

    /// Kill the process if it has not exited after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn exchange(&self, request: &AgentRequest) -> PainlineResult<AgentResponse> {
        let input = serde_json::to_vec(request).map_err(|e| PainlineError::InvalidRequest {
            reason: format!("request is not serializable: {e}"),
        })?;

        debug!(agent = %self.name, program = %self.program, "spawning agent process");
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.upstream(format!("cannot start '{}': {e}", self.program)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&input)
                .map_err(|e| self.upstream(format!("cannot write request: {e}")))?;
        }

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());
        let status = self.wait(&mut child)?;
        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            return Err(self.upstream(format!("exited with {status}: {}", stderr.trim())));
        }

        decode_reply(&self.name, &stdout)
    }

    /// Wait for exit, killing the process once the deadline passes.
    fn wait(&self, child: &mut Child) -> PainlineResult<ExitStatus> {
        let Some(limit) = self.timeout else {
            return child
                .wait()
                .map_err(|e| self.upstream(format!("cannot collect output: {e}")));
        };

        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) if started.elapsed() >= limit => {
                    let timeout_ms = limit.as_millis() as u64;
                    warn!(agent = %self.name, timeout_ms, "agent process timed out, killing it");
                    if let Err(e) = child.kill() {
                        warn!(agent = %self.name, error = %e, "could not kill agent process");
                    }
                    let _ = child.wait();
                    return Err(PainlineError::Timeout {
                        agent: self.name.clone(),
                        timeout_ms,
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(self.upstream(format!("cannot poll process: {e}"))),
            }
        }
    }

    fn upstream(&self, reason: String) -> PainlineError {
        PainlineError::UpstreamAgentFailure {
            agent: self.name.clone(),
            reason,
        }
    }
}

impl Agent for CommandAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, request: &AgentRequest) -> PainlineResult<Value> {
        let response = self.exchange(request)?;
        if response.success {
            Ok(response.body)
        } else {
            Err(self.upstream(response.error.unwrap_or_else(|| "unspecified failure".to_string())))
        }
    }

    /// Pass the process's own envelope through, so its `error_kind` survives.
    fn invoke(&self, request: &AgentRequest) -> AgentResponse {
        match self.exchange(request) {
            Ok(mut response) => {
                if response.agent.is_empty() {
                    response.agent = self.name.clone();
                }
                response
            }
            Err(err) => {
                warn!(agent = %self.name, error = %err, "agent process failed");
                AgentResponse::failure(self.name.clone(), &err)
            }
        }
    }
}

/// Read a pipe to its end on a helper thread so a full pipe never stalls the child.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

/// Decode a process reply in either envelope or flat form.
pub fn decode_reply(agent: &str, stdout: &[u8]) -> PainlineResult<AgentResponse> {
    let malformed = |reason: String| PainlineError::MalformedResponse {
        agent: agent.to_string(),
        reason,
    };

    let value: Value = serde_json::from_slice(stdout)
        .map_err(|e| malformed(format!("stdout is not JSON: {e}")))?;
    let Value::Object(mut fields) = value else {
        return Err(malformed("reply is not a JSON object".to_string()));
    };

    if fields.contains_key("body") {
        let mut response: AgentResponse = serde_json::from_value(Value::Object(fields))
            .map_err(|e| malformed(e.to_string()))?;
        if response.agent.is_empty() {
            response.agent = agent.to_string();
        }
        return Ok(response);
    }

    let success = fields
        .remove("success")
        .and_then(|v| v.as_bool())
        .ok_or_else(|| malformed("reply has no boolean 'success'".to_string()))?;
    let error = fields
        .remove("error")
        .and_then(|v| v.as_str().map(str::to_string));

    if success {
        Ok(AgentResponse::ok(agent, Value::Object(fields)))
    } else {
        Ok(AgentResponse {
            agent: agent.to_string(),
            success: false,
            body: Value::Null,
            error: error.or_else(|| Some("unspecified failure".to_string())),
            error_kind: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use painline_contracts::error::FailureKind;
    use serde_json::json;

    use super::*;

    #[test]
    fn flat_reply_becomes_body() {
        let reply = br#"{"success": true, "transcript": "my arm hurts", "language_code": "en-US"}"#;
        let resp = decode_reply("asr", reply).unwrap();
        assert!(resp.success);
        assert_eq!(resp.body, json!({ "transcript": "my arm hurts", "language_code": "en-US" }));
    }

    #[test]
    fn flat_failure_keeps_error() {
        let resp = decode_reply("tts", br#"{"success": false, "error": "no voice"}"#).unwrap();
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("no voice"));
        assert_eq!(resp.failure_kind(), Some(FailureKind::UpstreamAgentFailure));
    }

    #[test]
    fn envelope_reply_is_taken_verbatim() {
        let reply = br#"{"agent": "", "success": false, "body": null, "error": "slow", "error_kind": "timeout"}"#;
        let resp = decode_reply("asr", reply).unwrap();
        assert_eq!(resp.agent, "asr");
        assert_eq!(resp.failure_kind(), Some(FailureKind::Timeout));
    }

    #[test]
    fn garbage_is_malformed() {
        let err = decode_reply("asr", b"Traceback (most recent call last)").unwrap_err();
        assert!(matches!(err, PainlineError::MalformedResponse { .. }));

        let err = decode_reply("asr", b"{\"transcript\": \"x\"}").unwrap_err();
        assert!(err.to_string().contains("success"));
    }

    #[cfg(unix)]
    #[test]
    fn command_agent_round_trips_through_sh() {
        let agent = CommandAgent::new(
            "echo-asr",
            "sh",
            vec![
                "-c".to_string(),
                r#"cat >/dev/null; echo '{"success": true, "transcript": "7 out of 10"}'"#.to_string(),
            ],
        );
        let req = AgentRequest { kind: "asr".to_string(), payload: json!({ "audio_reference": "a.wav" }) };
        let resp = agent.invoke(&req);
        assert!(resp.success, "{:?}", resp.error);
        assert_eq!(resp.agent, "echo-asr");
        assert_eq!(resp.body["transcript"], "7 out of 10");
    }

    #[cfg(unix)]
    #[test]
    fn failing_command_is_upstream_failure() {
        let agent = CommandAgent::new(
            "broken",
            "sh",
            vec!["-c".to_string(), "cat >/dev/null; echo boom >&2; exit 3".to_string()],
        );
        let req = AgentRequest { kind: "tts".to_string(), payload: json!({}) };
        let resp = agent.invoke(&req);
        assert!(!resp.success);
        assert_eq!(resp.failure_kind(), Some(FailureKind::UpstreamAgentFailure));
        assert!(resp.error.unwrap().contains("boom"));
    }

    #[cfg(unix)]
    #[test]
    fn overdue_command_is_killed() {
        let marker = std::env::temp_dir().join(format!("painline-overdue-{}", std::process::id()));
        let _ = std::fs::remove_file(&marker);
        let agent = CommandAgent::new(
            "slow-asr",
            "sh",
            vec!["-c".to_string(), format!("sleep 1; touch '{}'", marker.display())],
        )
        .with_timeout(Duration::from_millis(100));
        let req = AgentRequest { kind: "asr".to_string(), payload: json!({}) };

        let err = agent.handle(&req).unwrap_err();
        assert!(
            matches!(err, PainlineError::Timeout { timeout_ms: 100, .. }),
            "got {err:?}"
        );

        // A surviving process would create the marker after its sleep.
        std::thread::sleep(Duration::from_millis(1500));
        assert!(!marker.exists());
    }

    #[cfg(unix)]
    #[test]
    fn prompt_command_beats_its_deadline() {
        let agent = CommandAgent::new(
            "quick-asr",
            "sh",
            vec![
                "-c".to_string(),
                r#"cat >/dev/null; echo '{"success": true, "transcript": "mild"}'"#.to_string(),
            ],
        )
        .with_timeout(Duration::from_secs(10));
        let req = AgentRequest { kind: "asr".to_string(), payload: json!({}) };
        let resp = agent.invoke(&req);
        assert!(resp.success, "{:?}", resp.error);
        assert_eq!(resp.body["transcript"], "mild");
    }

    #[test]
    fn missing_program_is_upstream_failure() {
        let agent = CommandAgent::new("ghost", "painline-no-such-binary", vec![]);
        let req = AgentRequest { kind: "asr".to_string(), payload: json!({}) };
        let err = agent.handle(&req).unwrap_err();
        assert!(matches!(err, PainlineError::UpstreamAgentFailure { .. }));
    }
}
