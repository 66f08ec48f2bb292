//! Scenario 1: Single Visit
//!
//! One recording, transcribed, scored, and spoken back.
//!
//! Pipeline walk-through for the demo run:
//!   1. ASR turns the recording into a transcript
//!   2. The estimator reads "6 out of 10" as the base and "throbbing" as +0.3
//!   3. The verifier checks the assessment agrees with its own bucket
//!   4. TTS receives the spoken summary for the output target
//!   5. Every step lands in the hash-chained audit log

use painline_config::PipelineConfig;
use painline_contracts::{error::PainlineResult, pipeline::PipelineResult};

use crate::{
    backends::{RecordingTtsAgent, ScriptedAsrAgent},
    report,
    runtime::PainlineRuntime,
};

use super::scripted_agents;

pub const AUDIO: &str = "single_visit.wav";
pub const TRANSCRIPT: &str = "My arm hurts about a 6 out of 10, it's throbbing.";
pub const OUTPUT_TARGET: &str = "single_visit_summary.wav";

pub fn run_scenario() -> PainlineResult<PipelineResult> {
    println!("=== Scenario 1: Single Visit ===");
    println!();
    println!("  Recording:  {AUDIO}");
    println!("  Said:       \"{TRANSCRIPT}\"");
    println!();

    let config = PipelineConfig::default();
    let tts = RecordingTtsAgent::new();
    let asr = ScriptedAsrAgent::new().with(AUDIO, TRANSCRIPT);
    let runtime = PainlineRuntime::with_agents(config.clone(), scripted_agents(&config, asr, &tts));

    let result = runtime.single_visit(AUDIO, Some(OUTPUT_TARGET.to_string()));

    report::print_result(&result);
    println!("  TTS requests:   {}", tts.requests().len());
    println!();
    report::print_audit(runtime.audit())?;
    println!();
    println!("  Scenario 1 complete.");
    println!();

    Ok(result)
}
