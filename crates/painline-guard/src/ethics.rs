//! Ethics review of a finished pain assessment.

use tracing::debug;

use painline_contracts::validation::{
    EthicalFlag, EthicsReview, Priority, Recommendation, Thresholds,
};

use crate::scanner::concerning_terms_in;

/// Review `score` against `thresholds` and `transcript` against the
/// concerning-term lexicon.
///
/// At most one threshold tier applies (the highest reached); each concerning
/// term adds its own human-review recommendation.
pub fn validate_assessment(
    score: f64,
    severity_label: &str,
    transcript: &str,
    thresholds: &Thresholds,
) -> EthicsReview {
    let mut recommendations = Vec::new();
    let mut flags: Vec<EthicalFlag> = Vec::new();
    let shown = display_score(score);

    if score >= thresholds.emergency {
        recommendations.push(Recommendation {
            priority: Priority::Immediate,
            action: "emergency_protocol".to_string(),
            reason: format!(
                "Pain score {shown} indicates severe distress requiring immediate medical attention"
            ),
        });
        flags.push(EthicalFlag::EmergencyPainLevel);
    } else if score >= thresholds.urgent {
        recommendations.push(Recommendation {
            priority: Priority::Urgent,
            action: "urgent_follow_up".to_string(),
            reason: format!("Pain score {shown} requires timely medical follow-up within 24 hours"),
        });
        flags.push(EthicalFlag::UrgentPainLevel);
    } else if score >= thresholds.concerning {
        recommendations.push(Recommendation {
            priority: Priority::Routine,
            action: "schedule_follow_up".to_string(),
            reason: format!("Pain score {shown} should be monitored and followed up"),
        });
    }

    for term in concerning_terms_in(transcript) {
        recommendations.push(Recommendation {
            priority: Priority::Immediate,
            action: "human_review_required".to_string(),
            reason: format!("Concerning language detected: {term}"),
        });
        if !flags.contains(&EthicalFlag::ConcerningLanguage) {
            flags.push(EthicalFlag::ConcerningLanguage);
        }
    }

    debug!(
        score,
        severity = %severity_label,
        flags = flags.len(),
        recommendations = recommendations.len(),
        "assessment reviewed"
    );

    EthicsReview {
        ethically_compliant: flags.is_empty(),
        requires_human_review: flags.iter().any(|f| f.requires_human_review()),
        flags,
        recommendations,
    }
}

/// Whole scores keep one decimal ("9.0"), others print as-is ("9.5").
fn display_score(score: f64) -> String {
    format!("{score:?}")
}
