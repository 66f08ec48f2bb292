//! # painline-core
//!
//! The fail-fast orchestration runtime for PAINLINE agents.
//!
//! This crate provides:
//! - The three core traits (`Agent`, `AuditWriter`, `Verifier`)
//! - `IsolatedRunner`, which contains agent panics and enforces deadlines
//! - The `Orchestrator` state machine for single- and dual-visit runs
//! - `CommandAgent`, an adapter for agents living in external processes
//!
//! ## Usage
//!
//! ```rust,ignore
//! use painline_core::{Orchestrator, AgentSet, traits::{Agent, AuditWriter, Verifier}};
//! ```

pub mod orchestrator;
pub mod process;
pub mod runner;
pub mod traits;

pub use orchestrator::{AgentSet, Orchestrator, OrchestratorSettings, ResponseSchemas};
pub use process::CommandAgent;
pub use runner::IsolatedRunner;
