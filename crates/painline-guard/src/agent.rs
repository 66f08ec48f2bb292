//! The security/ethics agent: mode dispatch, audit entry, overall status.

use chrono::Utc;
use serde_json::Value;
use tracing::info;

use painline_contracts::{
    agent::AgentRequest,
    error::{PainlineError, PainlineResult},
    validation::{
        AuditLogEntry, OverallStatus, Thresholds, ValidationRequest, ValidationResponse,
        ValidationSummary,
    },
};
use painline_core::traits::Agent;

use crate::{ethics::validate_assessment, scanner::scan_text};

pub const AGENT_NAME: &str = "security-ethics-agent";

#[derive(Debug, Clone, Default)]
pub struct SecurityEthicsAgent {
    thresholds: Thresholds,
}

impl SecurityEthicsAgent {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Run the sub-validations `request.mode` asks for.
    ///
    /// Input scanning needs non-empty `text`; assessment review needs
    /// `pain_score`. A missing field fails the whole request.
    pub fn process(&self, request: &ValidationRequest) -> PainlineResult<ValidationResponse> {
        let mode = request.mode;
        let session_id = request
            .session_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let input_validation = if mode.scans_input() {
            let text = request
                .text
                .as_deref()
                .filter(|t| !t.is_empty())
                .ok_or_else(|| PainlineError::MissingRequiredField { field: "text".to_string() })?;
            Some(scan_text(text))
        } else {
            None
        };

        let ethics_validation = if mode.reviews_assessment() {
            let score = request.pain_score.ok_or_else(|| PainlineError::MissingRequiredField {
                field: "pain_score".to_string(),
            })?;
            Some(validate_assessment(
                score,
                request.severity.as_deref().unwrap_or_default(),
                request.transcript.as_deref().unwrap_or_default(),
                &self.thresholds,
            ))
        } else {
            None
        };

        let summary = ValidationSummary {
            input_secure: input_validation.as_ref().map_or(true, |s| s.secure),
            ethically_compliant: ethics_validation.as_ref().map_or(true, |e| e.ethically_compliant),
            requires_escalation: input_validation.as_ref().map_or(false, |s| s.requires_escalation),
            requires_human_review: ethics_validation
                .as_ref()
                .map_or(false, |e| e.requires_human_review),
        };

        let overall_status = OverallStatus {
            approved: summary.input_secure && summary.ethically_compliant,
            requires_review: summary.requires_escalation || summary.requires_human_review,
            blocking_issues: !summary.input_secure,
        };

        let audit_log = AuditLogEntry {
            session_id: session_id.clone(),
            timestamp: Utc::now(),
            agent: AGENT_NAME.to_string(),
            validation_summary: summary,
            recommendations: ethics_validation
                .as_ref()
                .map(|e| e.recommendations.clone())
                .unwrap_or_default(),
            security_issues_count: input_validation.as_ref().map_or(0, |s| s.issues.len()),
            ethical_flags_count: ethics_validation.as_ref().map_or(0, |e| e.flags.len()),
        };

        info!(
            session_id = %session_id,
            mode = ?mode,
            approved = overall_status.approved,
            requires_review = overall_status.requires_review,
            security_issues = audit_log.security_issues_count,
            ethical_flags = audit_log.ethical_flags_count,
            "validation complete"
        );

        Ok(ValidationResponse {
            mode,
            session_id,
            input_validation,
            ethics_validation,
            audit_log,
            overall_status,
        })
    }
}

impl Agent for SecurityEthicsAgent {
    fn name(&self) -> &str {
        AGENT_NAME
    }

    fn handle(&self, request: &AgentRequest) -> PainlineResult<Value> {
        let body: ValidationRequest = request.parse()?;
        let response = self.process(&body)?;
        serde_json::to_value(&response).map_err(|e| PainlineError::MalformedResponse {
            agent: AGENT_NAME.to_string(),
            reason: e.to_string(),
        })
    }
}
