//! # painline-config
//!
//! TOML configuration for the PAINLINE pipeline.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use painline_config::PipelineConfig;
//!
//! let config = PipelineConfig::from_file(Path::new("painline.toml"))?;
//! let settings = config.orchestrator_settings();
//! ```
//!
//! ## Sections
//!
//! `[pipeline]` holds language, voice, default output target, per-agent
//! timeout and `block_on_rejection`. `[thresholds]` overrides the ethics
//! tiers. `[agents.asr]` and `[agents.tts]` plug in external engines.

pub mod config;

pub use config::{AgentsSection, CommandSpec, PipelineConfig, PipelineSection, DEFAULT_AGENT_TIMEOUT_MS};

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use painline_contracts::{
        capability::{DEFAULT_LANGUAGE_CODE, DEFAULT_VOICE},
        error::PainlineError,
        validation::Thresholds,
    };

    use crate::{CommandSpec, PipelineConfig};

    fn expect_config_error(toml: &str, needle: &str) {
        match PipelineConfig::from_toml_str(toml) {
            Err(PainlineError::ConfigError { reason }) => {
                assert!(reason.contains(needle), "expected '{needle}' in: {reason}");
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn empty_document_uses_defaults() {
        let config = PipelineConfig::from_toml_str("").unwrap();

        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.pipeline.language_code, DEFAULT_LANGUAGE_CODE);
        assert_eq!(config.pipeline.voice_identifier, DEFAULT_VOICE);
        assert_eq!(config.pipeline.default_output_target, "pain_assessment_output.wav");
        assert_eq!(config.thresholds, Thresholds::default());
        assert!(config.agents.asr.is_none());

        let settings = config.orchestrator_settings();
        assert_eq!(settings.agent_timeout, Some(Duration::from_secs(120)));
        assert!(!settings.block_on_rejection);
    }

    // ── Overrides ─────────────────────────────────────────────────────────────

    #[test]
    fn full_document_overrides_every_section() {
        let toml = r#"
            [pipeline]
            language_code = "en-GB"
            voice_identifier = "en-GB-Neural2-A"
            default_output_target = "out/summary.wav"
            agent_timeout_ms = 2500
            block_on_rejection = true

            [thresholds]
            emergency = 8.5
            urgent = 6.5

            [agents.asr]
            command = "/opt/asr/bin/transcribe"
            args = ["--model", "small"]

            [agents.tts]
            command = "synthesize"
        "#;

        let config = PipelineConfig::from_toml_str(toml).unwrap();

        assert_eq!(config.pipeline.language_code, "en-GB");
        assert_eq!(config.thresholds.emergency, 8.5);
        assert_eq!(config.thresholds.urgent, 6.5);
        assert_eq!(config.thresholds.concerning, 5.0, "unset threshold keeps default");
        assert_eq!(
            config.agents.asr,
            Some(CommandSpec {
                command: "/opt/asr/bin/transcribe".to_string(),
                args: vec!["--model".to_string(), "small".to_string()],
            })
        );
        assert!(config.agents.tts.as_ref().unwrap().args.is_empty());

        let settings = config.orchestrator_settings();
        assert_eq!(settings.agent_timeout, Some(Duration::from_millis(2500)));
        assert!(settings.block_on_rejection);
        assert_eq!(settings.default_output_target, "out/summary.wav");
    }

    #[test]
    fn zero_timeout_waits_indefinitely() {
        let config = PipelineConfig::from_toml_str("[pipeline]\nagent_timeout_ms = 0\n").unwrap();
        assert_eq!(config.agent_timeout(), None);
    }

    #[test]
    fn requests_carry_configured_language_and_voice() {
        let config = PipelineConfig::from_toml_str(
            "[pipeline]\nlanguage_code = \"fr-FR\"\nvoice_identifier = \"fr-FR-Wavenet-C\"\n",
        )
        .unwrap();

        let single = config.single_visit("visit.wav", Some("out.wav".to_string()));
        assert_eq!(single.audio_reference, "visit.wav");
        assert_eq!(single.language_code, "fr-FR");
        assert_eq!(single.voice_identifier, "fr-FR-Wavenet-C");
        assert_eq!(single.output_target.as_deref(), Some("out.wav"));

        let dual = config.dual_visit("a.wav", "b.wav", None);
        assert_eq!(dual.second_audio_reference, "b.wav");
        assert_eq!(dual.language_code, "fr-FR");
        assert!(dual.output_target.is_none());
    }

    // ── Errors ────────────────────────────────────────────────────────────────

    #[test]
    fn malformed_toml_is_config_error() {
        expect_config_error("this is not valid toml ][[[", "failed to parse pipeline TOML");
    }

    #[test]
    fn unknown_key_is_rejected() {
        expect_config_error("[thresholdz]\nemergency = 9.0\n", "thresholdz");
    }

    #[test]
    fn misordered_thresholds_are_rejected() {
        expect_config_error("[thresholds]\nemergency = 6.0\nurgent = 7.0\n", "emergency >= urgent");
    }

    #[test]
    fn off_scale_threshold_is_rejected() {
        expect_config_error("[thresholds]\nemergency = 12.0\n", "outside the 0-10 scale");
    }

    #[test]
    fn empty_agent_command_is_rejected() {
        expect_config_error("[agents.tts]\ncommand = \"  \"\n", "agents.tts.command");
    }

    #[test]
    fn missing_file_is_config_error() {
        let path = std::env::temp_dir().join("painline-config-does-not-exist.toml");
        match PipelineConfig::from_file(&path) {
            Err(PainlineError::ConfigError { reason }) => {
                assert!(reason.contains("failed to read config file"));
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn file_is_read_and_parsed() {
        let path = std::env::temp_dir().join(format!("painline-config-{}.toml", std::process::id()));
        std::fs::write(&path, "[pipeline]\nblock_on_rejection = true\n").unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(config.pipeline.block_on_rejection);
    }
}
