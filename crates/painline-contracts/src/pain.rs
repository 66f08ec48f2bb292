//! Pain estimate and pain-assessment agent types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Discrete severity classification derived from a 0–10 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityBucket {
    Mild,
    Moderate,
    Severe,
}

impl SeverityBucket {
    /// Bucketize a score: `≤ 3` mild, `≤ 6` moderate, otherwise severe.
    pub fn from_score(score: f64) -> Self {
        if score <= 3.0 {
            Self::Mild
        } else if score <= 6.0 {
            Self::Moderate
        } else {
            Self::Severe
        }
    }

    /// Short lowercase name, matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mild => "mild",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        }
    }

    /// Name with its score range, as spoken in summaries.
    pub fn label(self) -> &'static str {
        match self {
            Self::Mild => "mild (0–3)",
            Self::Moderate => "moderate (4–6)",
            Self::Severe => "severe (7–10)",
        }
    }
}

impl fmt::Display for SeverityBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A numeric rating-scale score and the bucket it falls in.
///
/// Construct through `PainEstimate::from_score` so `bucket` always agrees
/// with `score`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PainEstimate {
    pub score: f64,
    pub bucket: SeverityBucket,
}

impl PainEstimate {
    /// Clamp `score` to [0, 10] and derive its bucket.
    pub fn from_score(score: f64) -> Self {
        let score = score.clamp(0.0, 10.0);
        Self {
            score,
            bucket: SeverityBucket::from_score(score),
        }
    }
}

/// Request body for the pain-assessment agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PainAssessmentRequest {
    #[serde(default)]
    pub transcript: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visit_tag: Option<String>,
}

/// Response body of the pain-assessment agent.
///
/// `classification` and `regression_prediction` are filled only when an
/// auxiliary model is attached; they never influence `pain_nrs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PainAssessmentResponse {
    pub visit_tag: String,
    pub transcript: String,
    pub pain_nrs: f64,
    pub severity: SeverityBucket,
    #[serde(default)]
    pub classification: Option<serde_json::Value>,
    #[serde(default)]
    pub regression_prediction: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enrichment_errors: Vec<String>,
}

impl PainAssessmentResponse {
    /// The estimate this response carries.
    pub fn estimate(&self) -> PainEstimate {
        PainEstimate {
            score: self.pain_nrs,
            bucket: self.severity,
        }
    }
}
