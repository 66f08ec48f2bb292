//! Human-readable rendering of pipeline results.

use painline_audit::InMemoryAuditWriter;
use painline_contracts::{
    error::PainlineResult,
    pipeline::{FinalResult, PipelineResult, PipelineState},
};

fn state_name(state: &PipelineState) -> String {
    match state {
        PipelineState::Idle => "idle".to_string(),
        PipelineState::Asr { visit: Some(v) } => format!("asr({})", v.tag()),
        PipelineState::Asr { visit: None } => "asr".to_string(),
        PipelineState::Estimate => "estimate".to_string(),
        PipelineState::PainAssessment { visit } => format!("pain_assessment({})", visit.tag()),
        PipelineState::SecurityEthics => "security_ethics".to_string(),
        PipelineState::TestSecurity => "test_security".to_string(),
        PipelineState::Tts => "tts".to_string(),
        PipelineState::Done => "done".to_string(),
        PipelineState::Failed { step } => format!("failed({step})"),
    }
}

/// The result as indented report lines.
pub fn render(result: &PipelineResult) -> Vec<String> {
    let mut lines = vec![
        format!("  Session:        {}", result.session_id),
        format!(
            "  Transitions:    {}",
            result.transitions.iter().map(state_name).collect::<Vec<_>>().join(" -> ")
        ),
    ];

    match &result.final_result {
        FinalResult::SingleVisit(outcome) => {
            lines.push(format!("  Transcript:     {}", outcome.transcript));
            lines.push(format!("  Pain (NRS):     {:.1} ({})", outcome.pain_nrs, outcome.severity.label()));
            lines.push(format!("  Spoken summary: {}", outcome.assessment_text));
            lines.push(format!(
                "  Output audio:   {}",
                outcome.output_audio.as_deref().unwrap_or("(not synthesized)")
            ));
        }
        FinalResult::DualVisit(outcome) => {
            for visit in [&outcome.first_visit, &outcome.second_visit] {
                lines.push(format!(
                    "  {:<15} {:.1} ({}) \"{}\"",
                    format!("{}:", visit.visit_tag),
                    visit.pain_nrs,
                    visit.severity,
                    visit.transcript
                ));
            }
            let cmp = &outcome.comparison;
            lines.push(format!(
                "  Pain change:    {:+.1} ({} -> {})",
                cmp.pain_change, cmp.first_bucket, cmp.second_bucket
            ));
            lines.push(format!("  Approved:       {}", outcome.approved));
            lines.push(format!("  Needs review:   {}", outcome.requires_review));
            lines.push(format!(
                "  Synthesis:      {}",
                if outcome.tts_succeeded { "OK" } else { "FAILED (non-fatal)" }
            ));
        }
        FinalResult::Failed(failure) => {
            lines.push(format!("  FAILED at:      {}", failure.failed_step));
            lines.push(format!("  Error kind:     {:?}", failure.error_kind));
            lines.push(format!("  Error:          {}", failure.error));
        }
    }
    lines
}

pub fn print_result(result: &PipelineResult) {
    for line in render(result) {
        println!("{line}");
    }
}

/// Print the chain-integrity line for `audit`.
pub fn print_audit(audit: &InMemoryAuditWriter) -> PainlineResult<()> {
    let log = audit.export_log()?;
    println!(
        "  Audit chain integrity:  {} ({} event(s) in chain)",
        if audit.verify_integrity() { "VERIFIED" } else { "FAILED" },
        log.events.len()
    );
    Ok(())
}
