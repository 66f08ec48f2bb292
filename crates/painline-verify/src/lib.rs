//! # painline-verify
//!
//! Response verification for PAINLINE.
//!
//! [`verifier::SchemaVerifier`] implements [`painline_core::traits::Verifier`]:
//! JSON Schema validation via the `jsonschema` crate, then semantic rules
//! (`RequiredField`, `AllowedValues`, `NumericRange`, `Custom`).
//! [`schemas`] holds the per-capability schemas the orchestrator uses.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use painline_verify::schemas;
//!
//! let verifier = schemas::standard_verifier();
//! let orchestrator = Orchestrator::new(agents, Box::new(verifier), schemas::standard(), audit, settings);
//! ```

pub mod schemas;
pub mod verifier;

pub use verifier::{CustomVerifierFn, SchemaVerifier};
