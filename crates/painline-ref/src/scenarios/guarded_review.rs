//! Scenario 3: Guarded Review
//!
//! A second-visit recording leaks a social security number and describes
//! excruciating pain. The same dual-visit request runs twice:
//!
//!   1. With the default configuration the identifier is redacted, the
//!      re-scan passes, and the result is marked unapproved and for review.
//!   2. With `block_on_rejection = true` the run stops at the
//!      security/ethics step with `ValidationRejected`.

use painline_config::PipelineConfig;
use painline_contracts::{error::PainlineResult, pipeline::PipelineResult};

use crate::{
    backends::{RecordingTtsAgent, ScriptedAsrAgent},
    report,
    runtime::PainlineRuntime,
};

use super::scripted_agents;

pub const FIRST_AUDIO: &str = "visit_1.wav";
pub const SECOND_AUDIO: &str = "visit_2.wav";
pub const FIRST_TRANSCRIPT: &str = "My arm is a little sore, maybe moderate.";
pub const SECOND_TRANSCRIPT: &str =
    "My SSN is 123-45-6789, please note it. The pain is excruciating now.";

const BLOCKING_CONFIG: &str = r#"
[pipeline]
block_on_rejection = true
"#;

fn run_with(config: PipelineConfig) -> PainlineResult<PipelineResult> {
    let tts = RecordingTtsAgent::new();
    let asr = ScriptedAsrAgent::new()
        .with(FIRST_AUDIO, FIRST_TRANSCRIPT)
        .with(SECOND_AUDIO, SECOND_TRANSCRIPT);
    let runtime = PainlineRuntime::with_agents(config.clone(), scripted_agents(&config, asr, &tts));

    let result = runtime.dual_visit(FIRST_AUDIO, SECOND_AUDIO, None);
    report::print_result(&result);
    report::print_audit(runtime.audit())?;
    println!();
    Ok(result)
}

/// Run both configurations; returns (permissive, blocking) results.
pub fn run_scenario() -> PainlineResult<(PipelineResult, PipelineResult)> {
    println!("=== Scenario 3: Guarded Review ===");
    println!();
    println!("  Second visit:  \"{SECOND_TRANSCRIPT}\"");
    println!();

    println!("  -- block_on_rejection = false --");
    let permissive = run_with(PipelineConfig::default())?;

    println!("  -- block_on_rejection = true --");
    let blocking = run_with(PipelineConfig::from_toml_str(BLOCKING_CONFIG)?)?;

    println!("  Scenario 3 complete.");
    println!();
    Ok((permissive, blocking))
}
