//! # painline-contracts
//!
//! Shared types, agent envelopes, and the error taxonomy for the PAINLINE
//! pipeline.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate: only data definitions, invariant-preserving constructors, and
//! error types.

pub mod agent;
pub mod capability;
pub mod error;
pub mod execution;
pub mod pain;
pub mod pipeline;
pub mod validation;
pub mod verify;
