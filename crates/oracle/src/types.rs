//! Configuration and data types for the oracle crate.

use serde::Deserialize;

use crate::prompt::PromptSet;

/// Configuration for the chat-completion oracle.
#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    /// Base URL of the OpenAI-compatible server (e.g. "http://localhost:30000").
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Model name sent with every request.
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature for thought proposals. Defaults to 0.7.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Sampling temperature for critiques. Defaults to 0.2.
    #[serde(default = "default_critique_temperature")]
    pub critique_temperature: f64,
    /// Top-p (nucleus) sampling threshold. Defaults to 0.95.
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    /// Maximum tokens per completion. Defaults to 256.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    /// Per-request timeout in seconds. Defaults to 60.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Environment variable holding a bearer token, if the server needs one.
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Prompt templates; the built-in generator/evaluator prompts by default.
    #[serde(default)]
    pub prompts: PromptSet,
}

fn default_server_url() -> String {
    "http://localhost:30000".to_string()
}
fn default_model() -> String {
    "default".to_string()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_critique_temperature() -> f64 {
    0.2
}
fn default_top_p() -> f64 {
    0.95
}
fn default_max_tokens() -> usize {
    256
}
fn default_request_timeout() -> u64 {
    60
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            model: default_model(),
            temperature: default_temperature(),
            critique_temperature: default_critique_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout(),
            api_key_env: None,
            prompts: PromptSet::default(),
        }
    }
}

/// A proposal parsed from `THOUGHT:` / `REMAINING:` lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedThought {
    /// Text after `THOUGHT:`.
    pub description: String,
    /// Operand tokens listed after `REMAINING:`, unparsed.
    pub remaining: Vec<String>,
}

/// A critique parsed from `SCORE:` / `CRITIQUE:` lines.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedScore {
    /// Score in [0.0, 1.0].
    pub value: f64,
    /// Free-form rationale (empty if the model omitted it).
    pub critique: String,
    /// True if the raw score fell outside [0, 1] and was clamped.
    pub clamped: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oracle_config_defaults() {
        let cfg = OracleConfig::default();
        assert_eq!(cfg.server_url, "http://localhost:30000");
        assert!((cfg.temperature - 0.7).abs() < 1e-9);
        assert!((cfg.critique_temperature - 0.2).abs() < 1e-9);
        assert_eq!(cfg.max_tokens, 256);
        assert_eq!(cfg.request_timeout_secs, 60);
        assert!(cfg.api_key_env.is_none());
        assert!(cfg.prompts.generator.contains("THOUGHT:"));
    }

    #[test]
    fn test_oracle_config_partial_toml() {
        let toml_str = r#"
            server_url = "http://gpu-box:8000"
            temperature = 1.0
        "#;
        let cfg: OracleConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.server_url, "http://gpu-box:8000");
        assert!((cfg.temperature - 1.0).abs() < 1e-9);
        // Defaults
        assert_eq!(cfg.model, "default");
        assert!((cfg.top_p - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_prompt_override_keeps_other_default() {
        let toml_str = r#"
            [prompts]
            generator = "custom generator"
        "#;
        let cfg: OracleConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.prompts.generator, "custom generator");
        assert!(cfg.prompts.evaluator.contains("SCORE:"));
    }
}
