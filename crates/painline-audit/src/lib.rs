//! # painline-audit
//!
//! Append-only, SHA-256 hash-chained audit trail for PAINLINE runs.
//!
//! Every agent invocation the orchestrator makes is wrapped in an
//! `AuditEvent` linked to its predecessor by hash. Changing a single byte of
//! any stored event breaks the chain, and `verify_chain` reports it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use painline_audit::InMemoryAuditWriter;
//!
//! let writer = InMemoryAuditWriter::new("clinic-a");
//! let orchestrator = Orchestrator::new(agents, verifier, schemas, Box::new(writer.clone()), settings);
//! orchestrator.run_single_visit(&request);
//!
//! assert!(writer.verify_integrity());
//! let log = writer.export_log()?;
//! ```

pub mod chain;
pub mod event;
pub mod memory;

pub use chain::{first_broken_link, hash_event, verify_chain};
pub use event::{AuditEvent, AuditLog};
pub use memory::InMemoryAuditWriter;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use painline_contracts::{
        agent::{AgentRequest, AgentResponse},
        execution::StepRecord,
    };
    use painline_core::traits::AuditWriter;

    use super::{first_broken_link, verify_chain, AuditEvent, InMemoryAuditWriter};

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn make_record(session: &str, step: u64, transcript: &str) -> StepRecord {
        StepRecord {
            session_id: session.to_string(),
            step,
            step_name: "pain_nlp".to_string(),
            request: AgentRequest {
                kind: "pain_assessment".to_string(),
                payload: json!({ "transcript": transcript }),
            },
            response: AgentResponse::ok("pain-assessment-agent", json!({ "pain_nrs": 4.5 })),
            elapsed_ms: 3,
            timestamp: Utc::now(),
        }
    }

    fn write_three(writer: &InMemoryAuditWriter) {
        writer.write(&make_record("s-1", 0, "first")).unwrap();
        writer.write(&make_record("s-1", 1, "second")).unwrap();
        writer.write(&make_record("s-1", 2, "third")).unwrap();
    }

    // ── Tests ─────────────────────────────────────────────────────────────────

    #[test]
    fn sequential_writes_form_valid_chain() {
        let writer = InMemoryAuditWriter::new("log-integrity");
        write_three(&writer);
        assert!(writer.verify_integrity());
    }

    #[test]
    fn tampered_record_is_detected() {
        let writer = InMemoryAuditWriter::new("log-tamper");
        write_three(&writer);

        {
            let mut state = writer.state.lock().unwrap();
            state.events[1].record.request.payload = json!({ "transcript": "TAMPERED" });
        }

        assert!(!writer.verify_integrity());
        let log = writer.export_log().unwrap();
        assert_eq!(first_broken_link(&log.events), Some(1));
    }

    #[test]
    fn relinked_event_is_detected() {
        let writer = InMemoryAuditWriter::new("log-relink");
        write_three(&writer);
        let mut log = writer.export_log().unwrap();

        // Dropping an event breaks the next event's prev_hash.
        log.events.remove(1);
        assert_eq!(first_broken_link(&log.events), Some(2));
    }

    #[test]
    fn first_event_links_to_genesis() {
        let writer = InMemoryAuditWriter::new("log-genesis");
        writer.write(&make_record("s-1", 0, "first")).unwrap();

        let log = writer.export_log().unwrap();
        assert_eq!(log.events[0].prev_hash, AuditEvent::GENESIS_HASH);
        assert_eq!(log.terminal_hash, log.events[0].this_hash);
    }

    #[test]
    fn sessions_share_one_chain() {
        let writer = InMemoryAuditWriter::new("log-shared");
        writer.write(&make_record("s-1", 0, "a")).unwrap();
        writer.write(&make_record("s-2", 0, "b")).unwrap();
        writer.write(&make_record("s-1", 1, "c")).unwrap();
        writer.finalize("s-1").unwrap();

        let log = writer.export_log().unwrap();
        let sequences: Vec<u64> = log.events.iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
        assert_eq!(log.session_events("s-1").count(), 2);
        assert_eq!(log.finalized_sessions, vec!["s-1".to_string()]);
        assert!(writer.is_finalized("s-1"));
        assert!(!writer.is_finalized("s-2"));
        assert!(verify_chain(&log.events));
    }

    #[test]
    fn double_finalize_is_rejected() {
        let writer = InMemoryAuditWriter::new("log-final");
        writer.finalize("s-1").unwrap();
        assert!(writer.finalize("s-1").is_err());
    }

    #[test]
    fn clones_share_state() {
        let writer = InMemoryAuditWriter::new("log-clone");
        let handle = writer.clone();
        write_three(&writer);
        assert_eq!(handle.export_log().unwrap().events.len(), 3);
    }

    #[test]
    fn empty_chain_is_valid() {
        let writer = InMemoryAuditWriter::new("log-empty");
        assert!(writer.verify_integrity());
        assert!(verify_chain(&[]));
        assert_eq!(writer.export_log().unwrap().terminal_hash, "");
    }
}
