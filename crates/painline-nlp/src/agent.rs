//! The pain-assessment agent.
//!
//! Wraps the rule-based estimator behind the `Agent` envelope. Optional
//! auxiliary models may enrich the response with a classification or a
//! regression prediction; they never change `pain_nrs`, and their failures
//! are reported in `enrichment_errors` instead of failing the request.

use serde_json::Value;
use tracing::{debug, warn};

use painline_contracts::{
    agent::AgentRequest,
    error::{PainlineError, PainlineResult},
    pain::{PainAssessmentRequest, PainAssessmentResponse},
};
use painline_core::traits::Agent;

use crate::estimator;

pub const AGENT_NAME: &str = "pain-assessment-agent";

/// An auxiliary model scoring a transcript's feature vector.
pub trait ScoreModel: Send + Sync {
    fn predict(&self, features: &[f64]) -> Result<Value, String>;
}

/// Feature vector handed to auxiliary models:
/// `[transcript length in chars, occurrences of "pain"]`.
pub fn features(transcript: &str) -> [f64; 2] {
    let mentions = transcript.to_lowercase().matches("pain").count();
    [transcript.chars().count() as f64, mentions as f64]
}

#[derive(Default)]
pub struct PainAssessmentAgent {
    classifier: Option<Box<dyn ScoreModel>>,
    regressor: Option<Box<dyn ScoreModel>>,
}

impl PainAssessmentAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_classifier(mut self, model: impl ScoreModel + 'static) -> Self {
        self.classifier = Some(Box::new(model));
        self
    }

    pub fn with_regressor(mut self, model: impl ScoreModel + 'static) -> Self {
        self.regressor = Some(Box::new(model));
        self
    }

    /// Assess one transcript. An empty transcript is rejected.
    pub fn assess(&self, request: &PainAssessmentRequest) -> PainlineResult<PainAssessmentResponse> {
        if request.transcript.trim().is_empty() {
            return Err(PainlineError::MissingRequiredField {
                field: "transcript".to_string(),
            });
        }

        let estimate = estimator::estimate(&request.transcript);
        let mut response = PainAssessmentResponse {
            visit_tag: request.visit_tag.clone().unwrap_or_else(|| "unknown".to_string()),
            transcript: request.transcript.clone(),
            pain_nrs: estimate.score,
            severity: estimate.bucket,
            classification: None,
            regression_prediction: None,
            enrichment_errors: Vec::new(),
        };

        let features = features(&request.transcript);
        if let Some(model) = &self.classifier {
            match model.predict(&features) {
                Ok(label) => response.classification = Some(label),
                Err(e) => response.enrichment_errors.push(format!("classification: {e}")),
            }
        }
        if let Some(model) = &self.regressor {
            match model.predict(&features).and_then(|v| {
                v.as_f64()
                    .ok_or_else(|| format!("non-numeric prediction {v}"))
            }) {
                Ok(prediction) => response.regression_prediction = Some(prediction),
                Err(e) => response.enrichment_errors.push(format!("regression: {e}")),
            }
        }

        if !response.enrichment_errors.is_empty() {
            warn!(errors = ?response.enrichment_errors, "auxiliary model enrichment failed");
        }
        debug!(
            visit = %response.visit_tag,
            pain_nrs = response.pain_nrs,
            severity = %response.severity,
            "pain assessed"
        );
        Ok(response)
    }
}

impl Agent for PainAssessmentAgent {
    fn name(&self) -> &str {
        AGENT_NAME
    }

    fn handle(&self, request: &AgentRequest) -> PainlineResult<Value> {
        let body: PainAssessmentRequest = request.parse()?;
        let response = self.assess(&body)?;
        serde_json::to_value(&response).map_err(|e| PainlineError::MalformedResponse {
            agent: AGENT_NAME.to_string(),
            reason: e.to_string(),
        })
    }
}
