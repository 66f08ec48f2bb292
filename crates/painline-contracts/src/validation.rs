//! Security/ethics validation types.
//!
//! The validator answers two independent questions: is the text safe to
//! keep (sensitive data, concerning language), and does the assessment
//! call for follow-up (score thresholds, concerning language). Its response
//! always carries an `AuditLogEntry` and an `OverallStatus`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which sub-validations a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    InputValidation,
    AssessmentValidation,
    #[default]
    FullPipeline,
}

impl ValidationMode {
    /// True when the mode runs the input security scan.
    pub fn scans_input(self) -> bool {
        matches!(self, Self::InputValidation | Self::FullPipeline)
    }

    /// True when the mode runs the assessment ethics review.
    pub fn reviews_assessment(self) -> bool {
        matches!(self, Self::AssessmentValidation | Self::FullPipeline)
    }
}

/// Request body for the security/ethics agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationRequest {
    #[serde(default)]
    pub mode: ValidationMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pain_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Score thresholds for the ethics tiers. Lower bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub emergency: f64,
    pub urgent: f64,
    pub concerning: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            emergency: 9.0,
            urgent: 7.0,
            concerning: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Low,
    Medium,
    High,
}

/// The sensitive-data detectors, in scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitiveDataKind {
    Ssn,
    CardNumber,
    Email,
    Phone,
    Password,
}

/// One finding of the input security scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SecurityIssue {
    SensitiveData {
        detector: SensitiveDataKind,
        pattern: String,
        /// Byte span `[start, end)` of the match in the text it was found in.
        position: [usize; 2],
        severity: IssueSeverity,
    },
    ConcerningContent {
        term: String,
        severity: IssueSeverity,
        action_required: String,
    },
}

impl SecurityIssue {
    pub fn severity(&self) -> IssueSeverity {
        match self {
            Self::SensitiveData { severity, .. } | Self::ConcerningContent { severity, .. } => {
                *severity
            }
        }
    }

    pub fn is_sensitive_data(&self) -> bool {
        matches!(self, Self::SensitiveData { .. })
    }
}

/// Result of `scan_text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputScan {
    /// True iff `issues` is empty.
    pub secure: bool,
    pub issues: Vec<SecurityIssue>,
    /// The input with every sensitive-data match replaced by `[REDACTED]`.
    pub redacted_text: String,
    /// Concerning terms found, in lexicon order, each at most once.
    pub concerning_terms: Vec<String>,
    /// True iff `concerning_terms` is non-empty.
    pub requires_escalation: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EthicalFlag {
    EmergencyPainLevel,
    UrgentPainLevel,
    ConcerningLanguage,
}

impl EthicalFlag {
    /// Flags that force a human to look at the assessment.
    pub fn requires_human_review(self) -> bool {
        matches!(self, Self::EmergencyPainLevel | Self::ConcerningLanguage)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Routine,
    Urgent,
    Immediate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub action: String,
    pub reason: String,
}

/// Result of `validate_assessment`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EthicsReview {
    /// True iff `flags` is empty.
    pub ethically_compliant: bool,
    /// Distinct flags in the order they were first raised.
    pub flags: Vec<EthicalFlag>,
    /// Threshold recommendation first (if any), then one per concerning term.
    pub recommendations: Vec<Recommendation>,
    pub requires_human_review: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub input_secure: bool,
    pub ethically_compliant: bool,
    pub requires_escalation: bool,
    pub requires_human_review: bool,
}

/// Compliance record emitted once per validator invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub agent: String,
    pub validation_summary: ValidationSummary,
    pub recommendations: Vec<Recommendation>,
    pub security_issues_count: usize,
    pub ethical_flags_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallStatus {
    /// `secure && ethically_compliant`.
    pub approved: bool,
    /// `requires_escalation || requires_human_review`.
    pub requires_review: bool,
    /// `!secure`.
    pub blocking_issues: bool,
}

/// Response body of the security/ethics agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub mode: ValidationMode,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_validation: Option<InputScan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ethics_validation: Option<EthicsReview>,
    pub audit_log: AuditLogEntry,
    pub overall_status: OverallStatus,
}

impl ValidationResponse {
    /// Merge both sub-validations into one flat view.
    ///
    /// A sub-validation the mode did not run contributes its neutral value:
    /// secure, compliant, no flags, no escalation.
    pub fn result(&self) -> ValidationResult {
        let scan = self.input_validation.as_ref();
        let ethics = self.ethics_validation.as_ref();
        ValidationResult {
            secure: scan.map_or(true, |s| s.secure),
            issues: scan.map(|s| s.issues.clone()).unwrap_or_default(),
            redacted_text: scan.map(|s| s.redacted_text.clone()).unwrap_or_default(),
            concerning_terms: scan.map(|s| s.concerning_terms.clone()).unwrap_or_default(),
            ethically_compliant: ethics.map_or(true, |e| e.ethically_compliant),
            flags: ethics.map(|e| e.flags.clone()).unwrap_or_default(),
            recommendations: ethics.map(|e| e.recommendations.clone()).unwrap_or_default(),
            requires_human_review: ethics.map_or(false, |e| e.requires_human_review),
            requires_escalation: scan.map_or(false, |s| s.requires_escalation),
        }
    }
}

/// Flat view over a `ValidationResponse`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub secure: bool,
    pub issues: Vec<SecurityIssue>,
    pub redacted_text: String,
    pub concerning_terms: Vec<String>,
    pub ethically_compliant: bool,
    pub flags: Vec<EthicalFlag>,
    pub recommendations: Vec<Recommendation>,
    pub requires_human_review: bool,
    pub requires_escalation: bool,
}
