//! The response schemas PAINLINE trusts collaborator answers against.

use serde_json::{json, Value};

use painline_contracts::{
    pain::SeverityBucket,
    verify::{ResponseSchema, VerificationRule, VerificationRuleType},
};
use painline_core::ResponseSchemas;

use crate::verifier::SchemaVerifier;

/// Name of the custom rule checking that `severity` agrees with `pain_nrs`.
pub const SEVERITY_MATCHES_SCORE: &str = "severity-matches-score";

fn rule(id: &str, description: &str, rule_type: VerificationRuleType) -> VerificationRule {
    VerificationRule {
        rule_id: id.to_string(),
        description: description.to_string(),
        rule_type,
    }
}

/// Schemas for all four capabilities.
pub fn standard() -> ResponseSchemas {
    ResponseSchemas {
        asr: asr(),
        tts: tts(),
        pain_assessment: pain_assessment(),
        security_ethics: security_ethics(),
    }
}

/// A verifier with every custom rule the standard schemas reference.
pub fn standard_verifier() -> SchemaVerifier {
    let mut verifier = SchemaVerifier::new();
    verifier.register_rule(SEVERITY_MATCHES_SCORE, Box::new(severity_matches_score));
    verifier
}

fn severity_matches_score(body: &Value) -> Option<String> {
    let score = body.get("pain_nrs").and_then(Value::as_f64)?;
    let claimed = body.get("severity").and_then(Value::as_str)?;
    let expected = SeverityBucket::from_score(score);
    (claimed != expected.as_str())
        .then(|| format!("severity '{claimed}' does not match score {score} ({expected})"))
}

pub fn asr() -> ResponseSchema {
    ResponseSchema {
        schema_id: "asr-response-v1".to_string(),
        json_schema: json!({
            "type": "object",
            "properties": {
                "transcript": { "type": "string" },
                "audio_reference": { "type": "string" },
                "language_code": { "type": "string" }
            },
            "required": ["transcript"]
        }),
        rules: vec![],
    }
}

pub fn tts() -> ResponseSchema {
    ResponseSchema {
        schema_id: "tts-response-v1".to_string(),
        json_schema: json!({
            "type": "object",
            "properties": {
                "output_target": { "type": "string", "minLength": 1 },
                "byte_size": { "type": "integer", "minimum": 0 }
            },
            "required": ["output_target"]
        }),
        rules: vec![],
    }
}

pub fn pain_assessment() -> ResponseSchema {
    ResponseSchema {
        schema_id: "pain-assessment-response-v1".to_string(),
        json_schema: json!({
            "type": "object",
            "properties": {
                "visit_tag": { "type": "string" },
                "transcript": { "type": "string" },
                "pain_nrs": { "type": "number" },
                "severity": { "type": "string" },
                "enrichment_errors": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["visit_tag", "transcript", "pain_nrs", "severity"]
        }),
        rules: vec![
            rule(
                "pain-nrs-range",
                "pain_nrs lies on the 0–10 numeric rating scale",
                VerificationRuleType::NumericRange {
                    field_path: "pain_nrs".to_string(),
                    min: 0.0,
                    max: 10.0,
                },
            ),
            rule(
                "severity-bucket",
                "severity is one of the three buckets",
                VerificationRuleType::AllowedValues {
                    field_path: "severity".to_string(),
                    allowed: vec![json!("mild"), json!("moderate"), json!("severe")],
                },
            ),
            rule(
                "severity-consistent",
                "severity is the bucket of pain_nrs",
                VerificationRuleType::Custom {
                    function_name: SEVERITY_MATCHES_SCORE.to_string(),
                },
            ),
        ],
    }
}

pub fn security_ethics() -> ResponseSchema {
    ResponseSchema {
        schema_id: "security-ethics-response-v1".to_string(),
        json_schema: json!({
            "type": "object",
            "properties": {
                "session_id": { "type": "string" },
                "overall_status": {
                    "type": "object",
                    "properties": {
                        "approved": { "type": "boolean" },
                        "requires_review": { "type": "boolean" },
                        "blocking_issues": { "type": "boolean" }
                    },
                    "required": ["approved", "requires_review", "blocking_issues"]
                },
                "audit_log": { "type": "object" }
            },
            "required": ["mode", "session_id", "overall_status", "audit_log"]
        }),
        rules: vec![
            rule(
                "validation-mode",
                "mode is a known validation mode",
                VerificationRuleType::AllowedValues {
                    field_path: "mode".to_string(),
                    allowed: vec![
                        json!("input_validation"),
                        json!("assessment_validation"),
                        json!("full_pipeline"),
                    ],
                },
            ),
            rule(
                "audit-session",
                "every validation carries its audit entry's session",
                VerificationRuleType::RequiredField {
                    field_path: "audit_log.session_id".to_string(),
                },
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use painline_core::traits::Verifier;

    use super::*;

    #[test]
    fn consistent_assessment_passes() {
        let body = json!({
            "visit_tag": "first_visit",
            "transcript": "6 out of 10, throbbing",
            "pain_nrs": 6.3,
            "severity": "severe",
        });
        let report = standard_verifier().verify(&body, &pain_assessment()).unwrap();
        assert!(report.passed, "{}", report.summary());
    }

    #[test]
    fn out_of_range_score_fails() {
        let body = json!({
            "visit_tag": "first_visit",
            "transcript": "x",
            "pain_nrs": 12.0,
            "severity": "severe",
        });
        let report = standard_verifier().verify(&body, &pain_assessment()).unwrap();
        assert!(!report.passed);
        assert!(report.failures.iter().any(|f| f.rule_id == "pain-nrs-range"));
    }

    #[test]
    fn bucket_disagreeing_with_score_fails() {
        let body = json!({
            "visit_tag": "unknown",
            "transcript": "x",
            "pain_nrs": 2.0,
            "severity": "severe",
        });
        let report = standard_verifier().verify(&body, &pain_assessment()).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].rule_id, "severity-consistent");
    }

    #[test]
    fn asr_body_needs_transcript() {
        let verifier = standard_verifier();
        assert!(verifier.verify(&json!({ "transcript": "" }), &asr()).unwrap().passed);
        assert!(!verifier.verify(&json!({ "text": "hi" }), &asr()).unwrap().passed);
    }

    #[test]
    fn tts_body_needs_target() {
        let verifier = standard_verifier();
        let ok = json!({ "output_target": "out.wav", "byte_size": 2048 });
        assert!(verifier.verify(&ok, &tts()).unwrap().passed);
        let bad = json!({ "output_target": "", "byte_size": -1 });
        assert_eq!(verifier.verify(&bad, &tts()).unwrap().failures.len(), 2);
    }

    #[test]
    fn validation_body_needs_status_and_audit() {
        let verifier = standard_verifier();
        let body = json!({
            "mode": "input_validation",
            "session_id": "s-1",
            "overall_status": { "approved": true, "requires_review": false, "blocking_issues": false },
            "audit_log": { "session_id": "s-1" },
        });
        assert!(verifier.verify(&body, &security_ethics()).unwrap().passed);

        let body = json!({ "mode": "lenient", "session_id": "s-1" });
        let report = verifier.verify(&body, &security_ethics()).unwrap();
        let ids: Vec<&str> = report.failures.iter().map(|f| f.rule_id.as_str()).collect();
        assert!(ids.contains(&"json-schema"));
        assert!(ids.contains(&"validation-mode"));
        assert!(ids.contains(&"audit-session"));
    }
}
