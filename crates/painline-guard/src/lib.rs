//! # painline-guard
//!
//! The security/ethics gate. `scan_text` redacts sensitive data and spots
//! concerning language; `validate_assessment` maps a score onto follow-up
//! recommendations; `SecurityEthicsAgent` combines both behind the agent
//! envelope and emits the compliance audit entry.

pub mod agent;
pub mod ethics;
pub mod scanner;

pub use agent::SecurityEthicsAgent;
pub use ethics::validate_assessment;
pub use scanner::{scan_text, REDACTION};
