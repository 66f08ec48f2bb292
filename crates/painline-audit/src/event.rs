//! Audit event and exported log types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use painline_contracts::execution::StepRecord;

/// One link in the hash chain: a step record plus its position and hashes.
///
/// Changing any field, including those of the embedded `record`,
/// invalidates `this_hash` and every later `prev_hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Position in the chain, starting at 0.
    pub sequence: u64,
    /// The writer that produced this event.
    pub log_id: String,
    pub record: StepRecord,
    /// `this_hash` of the previous event, or `GENESIS_HASH` for the first.
    pub prev_hash: String,
    pub this_hash: String,
}

impl AuditEvent {
    /// The `prev_hash` of the first event in every chain.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// A snapshot of the whole chain, suitable for persisting as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub log_id: String,
    pub events: Vec<AuditEvent>,
    /// Sessions that reached a terminal state, in finalization order.
    pub finalized_sessions: Vec<String>,
    pub exported_at: DateTime<Utc>,
    /// `this_hash` of the last event; empty for an empty log.
    pub terminal_hash: String,
}

impl AuditLog {
    /// Events recorded for one pipeline run.
    pub fn session_events<'a>(&'a self, session_id: &'a str) -> impl Iterator<Item = &'a AuditEvent> {
        self.events
            .iter()
            .filter(move |e| e.record.session_id == session_id)
    }
}
