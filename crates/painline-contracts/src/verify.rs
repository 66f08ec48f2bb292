//! Response verification schema and report types.
//!
//! Before the orchestrator trusts a successful agent response, the verifier
//! checks its body against the capability's `ResponseSchema`. A failing
//! report turns the step into a `MalformedResponse` failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a capability's response body must look like.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseSchema {
    /// Unique identifier for this schema (e.g. "asr-response-v1").
    pub schema_id: String,
    /// A JSON Schema document used for structural validation. `null` skips it.
    pub json_schema: Value,
    /// Additional rules evaluated after structural validation.
    pub rules: Vec<VerificationRule>,
}

/// A single verification rule applied to a response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRule {
    /// Unique identifier for this rule, referenced in failure reports.
    pub rule_id: String,
    pub description: String,
    pub rule_type: VerificationRuleType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VerificationRuleType {
    /// The field at `field_path` must be present and non-null.
    RequiredField {
        /// Dotted path, e.g. "overall_status.approved".
        field_path: String,
    },

    /// The field at `field_path` must equal one of `allowed`.
    AllowedValues {
        field_path: String,
        allowed: Vec<Value>,
    },

    /// The numeric field at `field_path` must lie in `[min, max]`.
    NumericRange {
        field_path: String,
        min: f64,
        max: f64,
    },

    /// Delegate to a named function registered with the verifier.
    Custom {
        function_name: String,
    },
}

/// The result of running a `ResponseSchema` against a body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    /// True only if all rules passed.
    pub passed: bool,
    /// All failures collected during this run. Empty on pass.
    pub failures: Vec<VerificationFailure>,
}

impl VerificationReport {
    /// All failures joined as `[rule] message; ...`.
    pub fn summary(&self) -> String {
        self.failures
            .iter()
            .map(|f| format!("[{}] {}", f.rule_id, f.message))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationFailure {
    pub rule_id: String,
    pub message: String,
}
