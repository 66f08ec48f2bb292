//! Isolated agent invocation.
//!
//! Each invocation runs on its own worker thread. A panic inside the agent
//! kills only that worker and comes back as `AgentCrashed`; a worker that
//! outlives the deadline is abandoned and reported as `Timeout`. Either way
//! the caller always receives an `AgentResponse`.

use std::{
    any::Any,
    sync::{mpsc, Arc},
    thread,
    time::Duration,
};

use tracing::{debug, error, warn};

use painline_contracts::{
    agent::{AgentRequest, AgentResponse},
    error::PainlineError,
};

use crate::traits::Agent;

/// Runs agents in isolation with an optional deadline.
#[derive(Debug, Clone, Copy, Default)]
pub struct IsolatedRunner {
    timeout: Option<Duration>,
}

impl IsolatedRunner {
    /// `None` waits for as long as the agent takes.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Invoke `agent` with `request` on a dedicated worker thread.
    pub fn run(&self, agent: Arc<dyn Agent>, request: AgentRequest) -> AgentResponse {
        let name = agent.name().to_string();
        let (tx, rx) = mpsc::channel();

        let spawned = thread::Builder::new()
            .name(format!("agent-{name}"))
            .spawn(move || {
                let response = agent.invoke(&request);
                // The receiver is gone once the caller has given up on us.
                let _ = tx.send(response);
            });

        let worker = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                error!(agent = %name, error = %e, "could not spawn agent worker");
                return AgentResponse::failure(
                    name.clone(),
                    &PainlineError::AgentCrashed {
                        agent: name,
                        reason: format!("worker could not be spawned: {e}"),
                    },
                );
            }
        };

        let received = match self.timeout {
            Some(limit) => rx.recv_timeout(limit),
            None => rx.recv().map_err(|_| mpsc::RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(response) => {
                let _ = worker.join();
                debug!(agent = %name, success = response.success, "agent answered");
                response
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                let timeout_ms = self
                    .timeout
                    .map(|d| d.as_millis() as u64)
                    .unwrap_or_default();
                warn!(agent = %name, timeout_ms, "agent timed out, abandoning worker");
                AgentResponse::failure(
                    name.clone(),
                    &PainlineError::Timeout { agent: name, timeout_ms },
                )
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                let reason = match worker.join() {
                    Err(payload) => panic_message(payload.as_ref()),
                    Ok(()) => "worker exited without responding".to_string(),
                };
                error!(agent = %name, reason = %reason, "agent crashed");
                AgentResponse::failure(
                    name.clone(),
                    &PainlineError::AgentCrashed { agent: name, reason },
                )
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {msg}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use painline_contracts::error::{FailureKind, PainlineResult};
    use serde_json::json;

    use super::*;

    struct Echo;

    impl Agent for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn handle(&self, request: &AgentRequest) -> PainlineResult<serde_json::Value> {
            Ok(request.payload.clone())
        }
    }

    struct Sleepy(Duration);

    impl Agent for Sleepy {
        fn name(&self) -> &str {
            "sleepy"
        }

        fn handle(&self, _request: &AgentRequest) -> PainlineResult<serde_json::Value> {
            thread::sleep(self.0);
            Ok(json!({}))
        }
    }

    struct Panicky;

    impl Agent for Panicky {
        fn name(&self) -> &str {
            "panicky"
        }

        fn handle(&self, _request: &AgentRequest) -> PainlineResult<serde_json::Value> {
            panic!("engine exploded");
        }
    }

    fn request() -> AgentRequest {
        AgentRequest {
            kind: "asr".to_string(),
            payload: json!({ "audio_reference": "a.wav" }),
        }
    }

    #[test]
    fn answer_passes_through() {
        let resp = IsolatedRunner::new(Some(Duration::from_secs(5))).run(Arc::new(Echo), request());
        assert!(resp.success);
        assert_eq!(resp.agent, "echo");
        assert_eq!(resp.body["audio_reference"], "a.wav");
    }

    #[test]
    fn slow_agent_times_out_without_blocking_caller() {
        let runner = IsolatedRunner::new(Some(Duration::from_millis(50)));
        let started = Instant::now();
        let resp = runner.run(Arc::new(Sleepy(Duration::from_secs(2))), request());

        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!resp.success);
        assert_eq!(resp.failure_kind(), Some(FailureKind::Timeout));
        assert!(resp.error.unwrap().contains("50"));
    }

    #[test]
    fn panic_is_contained_as_crash() {
        let resp = IsolatedRunner::new(None).run(Arc::new(Panicky), request());
        assert!(!resp.success);
        assert_eq!(resp.failure_kind(), Some(FailureKind::AgentCrashed));
        assert!(resp.error.unwrap().contains("engine exploded"));
    }
}
