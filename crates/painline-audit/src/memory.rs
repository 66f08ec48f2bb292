//! In-memory implementation of `AuditWriter`.
//!
//! One writer may serve many pipeline runs: records from every session are
//! appended to a single chain, and each session is marked when the
//! orchestrator finalizes it.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::{debug, info};

use painline_contracts::{
    error::{PainlineError, PainlineResult},
    execution::StepRecord,
};
use painline_core::traits::AuditWriter;

use crate::{
    chain::{hash_event, verify_chain},
    event::{AuditEvent, AuditLog},
};

pub(crate) struct InMemoryState {
    pub(crate) events: Vec<AuditEvent>,
    pub(crate) finalized: Vec<String>,
    pub(crate) last_hash: String,
}

/// An append-only audit writer backed by a SHA-256 hash chain.
///
/// Cloning shares the underlying chain, so a clone kept by the caller can
/// export what the orchestrator wrote.
#[derive(Clone)]
pub struct InMemoryAuditWriter {
    log_id: String,
    pub(crate) state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryAuditWriter {
    pub fn new(log_id: impl Into<String>) -> Self {
        Self {
            log_id: log_id.into(),
            state: Arc::new(Mutex::new(InMemoryState {
                events: Vec::new(),
                finalized: Vec::new(),
                last_hash: AuditEvent::GENESIS_HASH.to_string(),
            })),
        }
    }

    fn lock(&self) -> PainlineResult<MutexGuard<'_, InMemoryState>> {
        self.state.lock().map_err(|e| PainlineError::AuditWriteFailed {
            reason: format!("audit state lock poisoned: {e}"),
        })
    }

    /// Snapshot every event written so far.
    pub fn export_log(&self) -> PainlineResult<AuditLog> {
        let state = self.lock()?;
        Ok(AuditLog {
            log_id: self.log_id.clone(),
            events: state.events.clone(),
            finalized_sessions: state.finalized.clone(),
            exported_at: Utc::now(),
            terminal_hash: state
                .events
                .last()
                .map(|e| e.this_hash.clone())
                .unwrap_or_default(),
        })
    }

    /// True when the in-memory chain is intact.
    pub fn verify_integrity(&self) -> bool {
        self.lock().map(|s| verify_chain(&s.events)).unwrap_or(false)
    }

    pub fn is_finalized(&self, session_id: &str) -> bool {
        self.lock()
            .map(|s| s.finalized.iter().any(|f| f == session_id))
            .unwrap_or(false)
    }
}

impl AuditWriter for InMemoryAuditWriter {
    fn write(&self, record: &StepRecord) -> PainlineResult<()> {
        let mut state = self.lock()?;

        let sequence = state.events.len() as u64;
        let prev_hash = state.last_hash.clone();
        let this_hash = hash_event(&self.log_id, sequence, record, &prev_hash)?;

        debug!(
            session_id = %record.session_id,
            sequence,
            step = %record.step_name,
            "audit event appended"
        );

        state.events.push(AuditEvent {
            sequence,
            log_id: self.log_id.clone(),
            record: record.clone(),
            prev_hash,
            this_hash: this_hash.clone(),
        });
        state.last_hash = this_hash;
        Ok(())
    }

    fn finalize(&self, session_id: &str) -> PainlineResult<()> {
        let mut state = self.lock()?;
        if state.finalized.iter().any(|s| s == session_id) {
            return Err(PainlineError::AuditWriteFailed {
                reason: format!("session '{session_id}' is already finalized"),
            });
        }
        state.finalized.push(session_id.to_string());

        let session_events = state
            .events
            .iter()
            .filter(|e| e.record.session_id == session_id)
            .count();
        info!(
            session_id = %session_id,
            event_count = session_events,
            terminal_hash = %state.last_hash,
            "audit log finalized"
        );
        Ok(())
    }
}
