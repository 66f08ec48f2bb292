//! Hash-chain primitives: hashing and chain verification.
//!
//! Hash input layout (bytes, in order):
//!   1. log_id as UTF-8 bytes
//!   2. sequence as 8-byte little-endian
//!   3. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   4. compact JSON of the step record

use sha2::{Digest, Sha256};

use painline_contracts::{
    error::{PainlineError, PainlineResult},
    execution::StepRecord,
};

use crate::event::AuditEvent;

/// SHA-256 over one event's position, link, and record, as lowercase hex.
pub fn hash_event(
    log_id: &str,
    sequence: u64,
    record: &StepRecord,
    prev_hash: &str,
) -> PainlineResult<String> {
    let record_json = serde_json::to_vec(record).map_err(|e| PainlineError::AuditWriteFailed {
        reason: format!("step record is not serializable: {e}"),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(log_id.as_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&record_json);

    Ok(hex::encode(hasher.finalize()))
}

/// Check prev-hash linkage and recompute every hash.
///
/// Returns the sequence number of the first broken event, or `None` for an
/// intact (or empty) chain.
pub fn first_broken_link(events: &[AuditEvent]) -> Option<u64> {
    let mut expected_prev: &str = AuditEvent::GENESIS_HASH;

    for event in events {
        if event.prev_hash != expected_prev {
            return Some(event.sequence);
        }
        match hash_event(&event.log_id, event.sequence, &event.record, &event.prev_hash) {
            Ok(recomputed) if recomputed == event.this_hash => {}
            _ => return Some(event.sequence),
        }
        expected_prev = event.this_hash.as_str();
    }

    None
}

/// True when the chain is intact. An empty chain is intact.
pub fn verify_chain(events: &[AuditEvent]) -> bool {
    first_broken_link(events).is_none()
}
