//! Scenario 2: Dual Visit
//!
//! Two recordings from successive visits, compared.
//!
//! Pipeline walk-through for the demo run:
//!   1. ASR transcribes the first visit, then the second
//!   2. Each transcript is assessed on its own (3.0 mild, then 7.0 severe)
//!   3. Both transcripts are validated together at the worse score
//!   4. The redacted text is re-scanned to prove nothing sensitive survived
//!   5. TTS receives the fixed dual-visit summary
//!   6. The comparison reports the visit-over-visit change

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
pub const FIRST_TRANSCRIPT: &str = "The pain in my arm is about a 3 out of 10 today.";
pub const SECOND_TRANSCRIPT: &str = "It has gotten worse since last time, now a 7 out of 10.";

pub fn run_scenario() -> PainlineResult<PipelineResult> {
    println!("=== Scenario 2: Dual Visit ===");
    println!();
    println!("  First visit:   \"{FIRST_TRANSCRIPT}\"");
    println!("  Second visit:  \"{SECOND_TRANSCRIPT}\"");
    println!();

    let config = PipelineConfig::default();
    let tts = RecordingTtsAgent::new();
    let asr = ScriptedAsrAgent::new()
        .with(FIRST_AUDIO, FIRST_TRANSCRIPT)
        .with(SECOND_AUDIO, SECOND_TRANSCRIPT);
    let runtime = PainlineRuntime::with_agents(config.clone(), scripted_agents(&config, asr, &tts));

    let result = runtime.dual_visit(FIRST_AUDIO, SECOND_AUDIO, None);

    report::print_result(&result);
    println!();
    report::print_audit(runtime.audit())?;
    println!();
    println!("  Scenario 2 complete.");
    println!();

    Ok(result)
}
