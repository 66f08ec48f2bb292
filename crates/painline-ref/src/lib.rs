//! # painline-ref
//!
//! Reference runtime for the PAINLINE arm-pain pipeline.
//!
//! - [`runtime`] builds a fully wired orchestrator from a `PipelineConfig`.
//! - [`backends`] holds the ASR/TTS agents used when no external engine is
//!   configured, plus scripted ones for demos.
//! - [`scenarios`] runs three end-to-end demos: single visit, dual visit,
//!   and a guarded review where sensitive data reaches the validator.
//! - [`report`] renders results for the terminal.

pub mod backends;
pub mod report;
pub mod runtime;
pub mod scenarios;

pub use runtime::{build_agents, PainlineRuntime};

// ── End-to-end tests ──────────────────────────────────────────────────────────
