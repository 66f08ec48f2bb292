//! PAINLINE arm-pain assessment pipeline CLI
//!
//! Usage:
//!   painline single --audio visit.wav --output-audio summary.wav
//!   painline dual --first visit1.wav --second visit2.wav --output-json result.json
//!   painline estimate "My arm hurts about a 6 out of 10" --explain
//!   painline validate --text "..." --score 7.5
//!   painline scenario all
//!
//! Without an `[agents.asr]` command in the config, audio is "transcribed"
//! by reading `<audio>.txt` next to it.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use painline_config::PipelineConfig;
use painline_contracts::{
    error::{PainlineError, PainlineResult},
    pipeline::PipelineResult,
    validation::{ValidationMode, ValidationRequest},
};
use painline_guard::SecurityEthicsAgent;
use painline_ref::{
    report,
    scenarios::{dual_visit, guarded_review, single_visit},
    PainlineRuntime,
};

// ── CLI definition ────────────────────────────────────────────────────────────

/// PAINLINE: spoken arm-pain descriptions to a reviewed severity estimate.
#[derive(Parser)]
#[command(
    name = "painline",
    about = "Arm-pain assessment pipeline: ASR, pain estimation, security/ethics review, TTS",
    long_about = "Runs the PAINLINE pipeline over one or two recordings, or its\n\
                  estimator and validator on their own. Set RUST_LOG=debug for step logs."
)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Single visit: ASR, estimate, optional TTS.
    Single {
        #[arg(long)]
        audio: String,
        /// Where to write the spoken summary. Synthesis is skipped without it.
        #[arg(long)]
        output_audio: Option<String>,
        #[command(flatten)]
        overrides: Overrides,
        /// Write the full result here instead of printing it.
        #[arg(long)]
        output_json: Option<PathBuf>,
    },
    /// Dual visit: two recordings compared, validated, and summarized.
    Dual {
        #[arg(long)]
        first: String,
        #[arg(long)]
        second: String,
        /// Where to write the spoken summary. Defaults to the configured target.
        #[arg(long)]
        output_audio: Option<String>,
        #[command(flatten)]
        overrides: Overrides,
        #[arg(long)]
        output_json: Option<PathBuf>,
    },
    /// Estimate a pain score from text.
    Estimate {
        /// Transcript text; multiple words are joined with spaces.
        #[arg(required = true)]
        text: Vec<String>,
        /// Print the full breakdown as JSON.
        #[arg(long)]
        explain: bool,
    },
    /// Run the security/ethics validator on text and/or a score.
    Validate {
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        score: Option<f64>,
        #[arg(long)]
        severity: Option<String>,
        #[arg(long, value_enum, default_value_t = Mode::Full)]
        mode: Mode,
        #[arg(long)]
        output_json: Option<PathBuf>,
    },
    /// Run a built-in demo scenario.
    Scenario {
        #[arg(value_enum, default_value_t = Scenario::All)]
        name: Scenario,
    },
}

/// Per-run overrides of the `[pipeline]` section.
#[derive(clap::Args)]
struct Overrides {
    #[arg(long)]
    language: Option<String>,
    #[arg(long)]
    voice: Option<String>,
}

impl Overrides {
    fn apply(&self, config: &mut PipelineConfig) {
        if let Some(language) = &self.language {
            config.pipeline.language_code = language.clone();
        }
        if let Some(voice) = &self.voice {
            config.pipeline.voice_identifier = voice.clone();
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Input,
    Assessment,
    Full,
}

impl From<Mode> for ValidationMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Input => ValidationMode::InputValidation,
            Mode::Assessment => ValidationMode::AssessmentValidation,
            Mode::Full => ValidationMode::FullPipeline,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Scenario {
    All,
    SingleVisit,
    DualVisit,
    GuardedReview,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("painline error: {e}");
            std::process::exit(2);
        }
    }
}

/// Returns whether the command's pipeline succeeded.
fn run(cli: Cli) -> PainlineResult<bool> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };

    match cli.command {
        Command::Single { audio, output_audio, overrides, output_json } => {
            overrides.apply(&mut config);
            config.validate()?;
            let runtime = PainlineRuntime::from_config(config);
            let result = runtime.single_visit(&audio, output_audio);
            emit_pipeline(&result, output_json.as_deref())
        }

        Command::Dual { first, second, output_audio, overrides, output_json } => {
            overrides.apply(&mut config);
            config.validate()?;
            let runtime = PainlineRuntime::from_config(config);
            let result = runtime.dual_visit(&first, &second, output_audio);
            emit_pipeline(&result, output_json.as_deref())
        }

        Command::Estimate { text, explain } => {
            let text = text.join(" ");
            if explain {
                print_json(&painline_nlp::explain(&text))?;
            } else {
                let estimate = painline_nlp::estimate(&text);
                println!("{:.1} ({})", estimate.score, estimate.bucket.label());
            }
            Ok(true)
        }

        Command::Validate { text, score, severity, mode, output_json } => {
            let request = ValidationRequest {
                mode: mode.into(),
                transcript: text.clone(),
                text,
                pain_score: score,
                severity,
                session_id: None,
            };
            let response = SecurityEthicsAgent::new(config.thresholds).process(&request)?;
            match output_json {
                Some(path) => write_json(&path, &response)?,
                None => print_json(&response)?,
            }
            Ok(response.overall_status.approved)
        }

        Command::Scenario { name } => {
            run_scenarios(name)?;
            Ok(true)
        }
    }
}

// ── Output ────────────────────────────────────────────────────────────────────

fn to_json<T: Serialize>(value: &T) -> PainlineResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| PainlineError::InvalidRequest {
        reason: format!("result is not serializable: {e}"),
    })
}

fn print_json<T: Serialize>(value: &T) -> PainlineResult<()> {
    println!("{}", to_json(value)?);
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> PainlineResult<()> {
    std::fs::write(path, to_json(value)?).map_err(|e| PainlineError::OutputWriteFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    info!(path = %path.display(), "result written");
    Ok(())
}

/// With a JSON path, write there and print the readable report; otherwise
/// print the JSON document.
fn emit_pipeline(result: &PipelineResult, output_json: Option<&Path>) -> PainlineResult<bool> {
    match output_json {
        Some(path) => {
            write_json(path, result)?;
            report::print_result(result);
            println!("  Result JSON:    {}", path.display());
        }
        None => print_json(result)?,
    }
    Ok(result.succeeded())
}

fn run_scenarios(name: Scenario) -> PainlineResult<()> {
    print_banner();
    match name {
        Scenario::All => {
            single_visit::run_scenario()?;
            dual_visit::run_scenario()?;
            guarded_review::run_scenario()?;
        }
        Scenario::SingleVisit => {
            single_visit::run_scenario()?;
        }
        Scenario::DualVisit => {
            dual_visit::run_scenario()?;
        }
        Scenario::GuardedReview => {
            guarded_review::run_scenario()?;
        }
    }
    println!("All selected scenarios completed.");
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("PAINLINE: Arm-pain Assessment Pipeline");
    println!("=======================================");
    println!();
    println!("Per run:");
    println!("  [1] ASR transcribes each recording");
    println!("  [2] The rule-based estimator scores each transcript on the 0-10 scale");
    println!("  [3] Security/ethics review redacts identifiers and tiers the score");
    println!("  [4] Every agent response is checked against its schema before use");
    println!("  [5] TTS speaks the summary (best-effort)");
    println!("  [6] Each invocation is appended to a SHA-256 hash-chained audit log");
    println!();
}
