//! # painline-nlp
//!
//! Pain estimation for PAINLINE: the rule-based estimator and the agent
//! that serves it.

pub mod agent;
pub mod estimator;

pub use agent::{PainAssessmentAgent, ScoreModel};
pub use estimator::{estimate, explain, EstimateBreakdown};
