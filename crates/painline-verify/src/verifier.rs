//! Schema-based response verifier.
//!
//! `SchemaVerifier` checks an agent's response body in two phases:
//!
//! 1. **Structural**: the body is validated against
//!    `ResponseSchema::json_schema` with the `jsonschema` crate.
//! 2. **Semantic**: each `VerificationRule` is evaluated in order.
//!
//! All failures are collected before returning, so one report shows the
//! full failure set.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use painline_contracts::{
    error::PainlineResult,
    verify::{ResponseSchema, VerificationFailure, VerificationReport, VerificationRuleType},
};
use painline_core::traits::Verifier;

/// A named check over a whole response body.
///
/// Returns `Some(message)` on failure, `None` on success.
pub type CustomVerifierFn = Box<dyn Fn(&Value) -> Option<String> + Send + Sync>;

pub struct SchemaVerifier {
    custom_rules: HashMap<String, CustomVerifierFn>,
}

impl SchemaVerifier {
    /// A verifier with no custom rules registered.
    pub fn new() -> Self {
        Self {
            custom_rules: HashMap::new(),
        }
    }

    /// Register `f` under `name`, replacing any earlier function of that name.
    pub fn register_rule(&mut self, name: impl Into<String>, f: CustomVerifierFn) {
        self.custom_rules.insert(name.into(), f);
    }

    /// Resolve a dotted path; `None` when a segment is missing or null.
    fn resolve_path<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
        let mut current = value;
        for segment in path.split('.') {
            match current.get(segment) {
                Some(v) if !v.is_null() => current = v,
                _ => return None,
            }
        }
        Some(current)
    }

    fn check_structure(body: &Value, schema: &ResponseSchema, failures: &mut Vec<VerificationFailure>) {
        if schema.json_schema.is_null() {
            return;
        }
        match jsonschema::validator_for(&schema.json_schema) {
            Ok(validator) => {
                for error in validator.iter_errors(body) {
                    let message = format!("JSON Schema violation at {}: {}", error.instance_path, error);
                    warn!(schema_id = %schema.schema_id, %message, "structural validation failure");
                    failures.push(VerificationFailure {
                        rule_id: "json-schema".to_string(),
                        message,
                    });
                }
            }
            Err(e) => {
                let message = format!("invalid JSON Schema document: {e}");
                warn!(schema_id = %schema.schema_id, %message, "schema compilation failure");
                failures.push(VerificationFailure {
                    rule_id: "json-schema".to_string(),
                    message,
                });
            }
        }
    }

    fn check_rule(&self, body: &Value, rule_type: &VerificationRuleType) -> Option<String> {
        match rule_type {
            VerificationRuleType::RequiredField { field_path } => Self::resolve_path(body, field_path)
                .is_none()
                .then(|| format!("required field '{field_path}' is missing or null")),

            VerificationRuleType::AllowedValues { field_path, allowed } => {
                match Self::resolve_path(body, field_path) {
                    None => Some(format!(
                        "field '{field_path}' is missing; cannot check allowed values"
                    )),
                    Some(actual) if allowed.contains(actual) => None,
                    Some(actual) => Some(format!(
                        "field '{field_path}' has value {actual} which is not in the allowed set"
                    )),
                }
            }

            VerificationRuleType::NumericRange { field_path, min, max } => {
                match Self::resolve_path(body, field_path).and_then(Value::as_f64) {
                    None => Some(format!("field '{field_path}' is missing or not a number")),
                    Some(n) if (*min..=*max).contains(&n) => None,
                    Some(n) => Some(format!(
                        "field '{field_path}' is {n}, outside [{min}, {max}]"
                    )),
                }
            }

            // An unregistered name is itself a failure.
            VerificationRuleType::Custom { function_name } => {
                match self.custom_rules.get(function_name.as_str()) {
                    Some(f) => f(body),
                    None => Some(format!(
                        "no custom rule registered for function name '{function_name}'"
                    )),
                }
            }
        }
    }
}

impl Default for SchemaVerifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Verifier for SchemaVerifier {
    fn verify(&self, body: &Value, schema: &ResponseSchema) -> PainlineResult<VerificationReport> {
        let mut failures: Vec<VerificationFailure> = Vec::new();

        Self::check_structure(body, schema, &mut failures);

        for rule in &schema.rules {
            debug!(
                rule_id = %rule.rule_id,
                description = %rule.description,
                "evaluating verification rule"
            );
            if let Some(message) = self.check_rule(body, &rule.rule_type) {
                warn!(rule_id = %rule.rule_id, %message, "semantic rule failed");
                failures.push(VerificationFailure {
                    rule_id: rule.rule_id.clone(),
                    message,
                });
            }
        }

        let passed = failures.is_empty();
        debug!(
            schema_id = %schema.schema_id,
            passed,
            failure_count = failures.len(),
            "verification complete"
        );
        Ok(VerificationReport { passed, failures })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use painline_contracts::verify::{ResponseSchema, VerificationRule, VerificationRuleType};
    use painline_core::traits::Verifier;

    use super::SchemaVerifier;

    // ── Builder helpers ───────────────────────────────────────────────────────

    fn make_schema(json_schema: serde_json::Value, rules: Vec<VerificationRule>) -> ResponseSchema {
        ResponseSchema {
            schema_id: "test-schema-v1".to_string(),
            json_schema,
            rules,
        }
    }

    fn rule(id: &str, rule_type: VerificationRuleType) -> VerificationRule {
        VerificationRule {
            rule_id: id.to_string(),
            description: format!("{id} check"),
            rule_type,
        }
    }

    fn transcript_schema() -> serde_json::Value {
        json!({
            "type": "object",
            "properties": { "transcript": { "type": "string" } },
            "required": ["transcript"]
        })
    }

    // ── JSON Schema ───────────────────────────────────────────────────────────

    #[test]
    fn schema_pass() {
        let report = SchemaVerifier::new()
            .verify(&json!({ "transcript": "hurts" }), &make_schema(transcript_schema(), vec![]))
            .unwrap();
        assert!(report.passed, "failures: {:?}", report.failures);
    }

    #[test]
    fn schema_fail() {
        let report = SchemaVerifier::new()
            .verify(&json!({ "text": 42 }), &make_schema(transcript_schema(), vec![]))
            .unwrap();
        assert!(!report.passed);
        assert_eq!(report.failures[0].rule_id, "json-schema");
    }

    // ── RequiredField ─────────────────────────────────────────────────────────

    #[test]
    fn required_field_resolves_dotted_path() {
        let schema = make_schema(
            serde_json::Value::Null,
            vec![rule(
                "req-approved",
                VerificationRuleType::RequiredField {
                    field_path: "overall_status.approved".to_string(),
                },
            )],
        );
        let verifier = SchemaVerifier::new();

        let ok = verifier
            .verify(&json!({ "overall_status": { "approved": false } }), &schema)
            .unwrap();
        assert!(ok.passed, "false is present, not missing");

        let missing = verifier.verify(&json!({ "overall_status": {} }), &schema).unwrap();
        assert!(!missing.passed);
        assert_eq!(missing.failures[0].rule_id, "req-approved");
        assert!(missing.failures[0].message.contains("overall_status.approved"));
    }

    // ── AllowedValues ─────────────────────────────────────────────────────────

    #[test]
    fn allowed_values() {
        let schema = make_schema(
            serde_json::Value::Null,
            vec![rule(
                "severity-set",
                VerificationRuleType::AllowedValues {
                    field_path: "severity".to_string(),
                    allowed: vec![json!("mild"), json!("moderate"), json!("severe")],
                },
            )],
        );
        let verifier = SchemaVerifier::new();

        assert!(verifier.verify(&json!({ "severity": "mild" }), &schema).unwrap().passed);
        let report = verifier.verify(&json!({ "severity": "unbearable" }), &schema).unwrap();
        assert!(!report.passed);
        assert!(report.failures[0].message.contains("unbearable"));
    }

    // ── NumericRange ──────────────────────────────────────────────────────────

    #[test]
    fn numeric_range_is_inclusive() {
        let schema = make_schema(
            serde_json::Value::Null,
            vec![rule(
                "nrs-range",
                VerificationRuleType::NumericRange {
                    field_path: "pain_nrs".to_string(),
                    min: 0.0,
                    max: 10.0,
                },
            )],
        );
        let verifier = SchemaVerifier::new();

        for ok in [0.0, 6.3, 10.0] {
            assert!(verifier.verify(&json!({ "pain_nrs": ok }), &schema).unwrap().passed, "{ok}");
        }
        for bad in [json!(10.5), json!(-1), json!("seven")] {
            let report = verifier.verify(&json!({ "pain_nrs": bad }), &schema).unwrap();
            assert!(!report.passed, "{bad}");
            assert_eq!(report.failures[0].rule_id, "nrs-range");
        }
    }

    // ── Custom ────────────────────────────────────────────────────────────────

    #[test]
    fn custom_rule_pass_and_fail() {
        let mut verifier = SchemaVerifier::new();
        verifier.register_rule("always-pass", Box::new(|_body| None));
        verifier.register_rule(
            "always-fail",
            Box::new(|_body| Some("custom check failed: condition not met".to_string())),
        );

        let pass = make_schema(
            serde_json::Value::Null,
            vec![rule("custom-ok", VerificationRuleType::Custom { function_name: "always-pass".to_string() })],
        );
        assert!(verifier.verify(&json!({}), &pass).unwrap().passed);

        let fail = make_schema(
            serde_json::Value::Null,
            vec![rule("custom-check", VerificationRuleType::Custom { function_name: "always-fail".to_string() })],
        );
        let report = verifier.verify(&json!({}), &fail).unwrap();
        assert_eq!(report.failures[0].rule_id, "custom-check");
        assert!(report.failures[0].message.contains("condition not met"));
    }

    #[test]
    fn unregistered_custom_rule_fails() {
        let schema = make_schema(
            serde_json::Value::Null,
            vec![rule(
                "phantom-check",
                VerificationRuleType::Custom { function_name: "does-not-exist".to_string() },
            )],
        );
        let report = SchemaVerifier::new().verify(&json!({}), &schema).unwrap();
        assert!(!report.passed);
        assert!(report.failures[0].message.contains("does-not-exist"));
    }

    #[test]
    fn all_failures_are_collected() {
        let schema = make_schema(
            transcript_schema(),
            vec![
                rule("req-a", VerificationRuleType::RequiredField { field_path: "a".to_string() }),
                rule("req-b", VerificationRuleType::RequiredField { field_path: "b".to_string() }),
            ],
        );
        let report = SchemaVerifier::new().verify(&json!({}), &schema).unwrap();
        let ids: Vec<&str> = report.failures.iter().map(|f| f.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["json-schema", "req-a", "req-b"]);
        assert!(report.summary().contains("[req-b]"));
    }
}
