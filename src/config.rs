//! Configuration for the QC pipeline.
//!
//! Supports both environment variables and YAML config file.
//! Environment variables take precedence over config file values.

use crate::error::{QcError, Result};
use crate::score::ScoreStrategy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Browser-like user agent; the chatbot endpoint rejects bare HTTP clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// LLM configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL for the LLM API (e.g., "https://api.openai.com")
    pub api_base: String,

    /// API key for authentication
    pub api_key: String,

    /// Model name (e.g., "gpt-4")
    pub model: String,

    /// Maximum tokens for response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Temperature for generation
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on a single generation call, in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.0
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_remote_timeout() -> u64 {
    60
}

fn default_variant_count() -> usize {
    5
}

fn default_pass_threshold() -> u32 {
    95
}

fn default_true() -> bool {
    true
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "gpt-4".to_string(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

/// Settings for the chatbot endpoint under test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteQaConfig {
    /// Whether paraphrases are sent to the endpoint at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Endpoint URL receiving `{"question": ..., "test": true}`.
    pub url: String,

    /// Value of the `Referer` header.
    pub referer: String,

    /// Value of the `User-Agent` header.
    pub user_agent: String,

    /// Upper bound on a single endpoint call, in seconds.
    #[serde(default = "default_remote_timeout")]
    pub timeout_secs: u64,
}

impl RemoteQaConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RemoteQaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: String::new(),
            referer: String::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: default_remote_timeout(),
        }
    }
}

/// Knobs of the evaluation pipeline itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Number of paraphrases requested per question.
    #[serde(default = "default_variant_count")]
    pub variant_count: usize,

    /// Send the paraphrases of one question to the endpoint concurrently.
    #[serde(default)]
    pub parallel_remote: bool,

    /// How the audit score is read out of the auditor's text.
    #[serde(default)]
    pub score_strategy: ScoreStrategy,

    /// Scores at or above this are highlighted as passing in reports.
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: u32,

    /// Where reports go; next to each document when unset.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            variant_count: default_variant_count(),
            parallel_remote: false,
            score_strategy: ScoreStrategy::default(),
            pass_threshold: default_pass_threshold(),
            output_dir: None,
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// LLM settings
    pub llm: LlmConfig,
    /// Chatbot endpoint settings
    #[serde(default)]
    pub remote_qa: RemoteQaConfig,
    /// Pipeline settings
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Configuration file structure (YAML format).
#[derive(Debug, Deserialize)]
struct ConfigFile {
    llm: Option<LlmFileSection>,
    remote_qa: Option<RemoteQaFileSection>,
    pipeline: Option<PipelineFileSection>,
}

#[derive(Debug, Deserialize)]
struct LlmFileSection {
    api_base: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RemoteQaFileSection {
    enabled: Option<bool>,
    url: Option<String>,
    referer: Option<String>,
    user_agent: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct PipelineFileSection {
    variant_count: Option<usize>,
    parallel_remote: Option<bool>,
    score_strategy: Option<ScoreStrategy>,
    pass_threshold: Option<u32>,
    output_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables and optional config file.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (LLM_API_KEY / OPENAI_API_KEY, CHL_API_URL, ...)
    /// 2. Config file (`explicit_path`, else ~/.config/chatbot-qc/config.yaml)
    /// 3. Default values
    ///
    /// A missing LLM credential is logged but not rejected here; use
    /// [`Config::validate`] to fail fast.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = Config::default();

        match explicit_path {
            Some(path) => config = Self::load_from_file(path)?,
            None => {
                if let Some(config_path) = Self::config_file_path() {
                    if config_path.exists() {
                        config = Self::load_from_file(&config_path)?;
                    }
                }
            }
        }

        config.apply_env(|key| env::var(key).ok());

        if config.llm.api_key.is_empty() {
            tracing::error!("LLM API key not found in environment or config file");
        } else {
            tracing::info!("Configuration loaded");
        }

        Ok(config)
    }

    /// Override fields from an environment lookup.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(api_base) = lookup("LLM_API_BASE") {
            self.llm.api_base = api_base;
        }

        if let Some(api_key) = lookup("LLM_API_KEY").or_else(|| lookup("OPENAI_API_KEY")) {
            self.llm.api_key = api_key;
        }

        if let Some(model) = lookup("LLM_MODEL") {
            self.llm.model = model;
        }

        if let Some(tokens) = lookup("LLM_MAX_TOKENS").and_then(|v| v.parse().ok()) {
            self.llm.max_tokens = tokens;
        }

        if let Some(temp) = lookup("LLM_TEMPERATURE").and_then(|v| v.parse().ok()) {
            self.llm.temperature = temp;
        }

        if let Some(secs) = lookup("LLM_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.llm.timeout_secs = secs;
        }

        if let Some(url) = lookup("CHL_API_URL") {
            self.remote_qa.url = url;
        }

        if let Some(referer) = lookup("CHL_API_REFERER") {
            self.remote_qa.referer = referer;
        }

        if let Some(user_agent) = lookup("CHL_API_USER_AGENT") {
            self.remote_qa.user_agent = user_agent;
        }

        if let Some(secs) = lookup("CHL_API_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.remote_qa.timeout_secs = secs;
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| QcError::io(path, e))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text, starting from defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let file_config: ConfigFile = serde_yaml::from_str(content)
            .map_err(|e| QcError::Config(format!("Failed to parse config file: {}", e)))?;

        let mut config = Config::default();

        if let Some(llm) = file_config.llm {
            if let Some(api_base) = llm.api_base {
                config.llm.api_base = api_base;
            }
            if let Some(api_key) = llm.api_key {
                config.llm.api_key = api_key;
            }
            if let Some(model) = llm.model {
                config.llm.model = model;
            }
            if let Some(max_tokens) = llm.max_tokens {
                config.llm.max_tokens = max_tokens;
            }
            if let Some(temperature) = llm.temperature {
                config.llm.temperature = temperature;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                config.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(remote) = file_config.remote_qa {
            if let Some(enabled) = remote.enabled {
                config.remote_qa.enabled = enabled;
            }
            if let Some(url) = remote.url {
                config.remote_qa.url = url;
            }
            if let Some(referer) = remote.referer {
                config.remote_qa.referer = referer;
            }
            if let Some(user_agent) = remote.user_agent {
                config.remote_qa.user_agent = user_agent;
            }
            if let Some(timeout_secs) = remote.timeout_secs {
                config.remote_qa.timeout_secs = timeout_secs;
            }
        }

        if let Some(pipeline) = file_config.pipeline {
            if let Some(variant_count) = pipeline.variant_count {
                config.pipeline.variant_count = variant_count;
            }
            if let Some(parallel) = pipeline.parallel_remote {
                config.pipeline.parallel_remote = parallel;
            }
            if let Some(strategy) = pipeline.score_strategy {
                config.pipeline.score_strategy = strategy;
            }
            if let Some(threshold) = pipeline.pass_threshold {
                config.pipeline.pass_threshold = threshold;
            }
            if pipeline.output_dir.is_some() {
                config.pipeline.output_dir = pipeline.output_dir;
            }
        }

        Ok(config)
    }

    /// Get the default config file path.
    pub fn config_file_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "chatbot-qc")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Validate that required configuration is present.
    pub fn validate(&self) -> Result<()> {
        if self.llm.api_base.is_empty() {
            return Err(QcError::Config(
                "LLM API base URL is required. Set LLM_API_BASE environment variable or add to config file.".to_string()
            ));
        }

        if self.llm.api_key.is_empty() {
            return Err(QcError::Config(
                "LLM API key is required. Set LLM_API_KEY (or OPENAI_API_KEY) environment variable or add to config file.".to_string()
            ));
        }

        if self.llm.model.is_empty() {
            return Err(QcError::Config(
                "LLM model is required. Set LLM_MODEL environment variable or add to config file."
                    .to_string(),
            ));
        }

        if self.remote_qa.enabled && self.remote_qa.url.is_empty() {
            return Err(QcError::Config(
                "Chatbot endpoint URL is required when remote QA is enabled. Set CHL_API_URL or pass --no-remote.".to_string()
            ));
        }

        if self.pipeline.variant_count == 0 {
            return Err(QcError::Config(
                "variant_count must be at least 1".to_string(),
            ));
        }

        if self.llm.timeout_secs == 0 {
            return Err(QcError::Config(
                "LLM timeout must be at least 1 second (LLM_TIMEOUT_SECS)".to_string(),
            ));
        }

        if self.remote_qa.enabled && self.remote_qa.timeout_secs == 0 {
            return Err(QcError::Config(
                "Chatbot timeout must be at least 1 second (CHL_API_TIMEOUT_SECS)".to_string(),
            ));
        }

        Ok(())
    }

    /// Create a config from explicit values (useful for testing).
    pub fn with_llm(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            llm: LlmConfig {
                api_base: api_base.into(),
                api_key: api_key.into(),
                model: model.into(),
                ..Default::default()
            },
            remote_qa: RemoteQaConfig {
                enabled: false,
                ..Default::default()
            },
            pipeline: PipelineConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.llm.api_key.is_empty());
        assert_eq!(config.llm.model, "gpt-4");
        assert_eq!(config.llm.max_tokens, 4096);
        assert_eq!(config.llm.temperature, 0.0);
        assert_eq!(config.pipeline.variant_count, 5);
        assert_eq!(config.pipeline.pass_threshold, 95);
        assert!(config.remote_qa.enabled);
        assert_eq!(config.remote_qa.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_validate_fails_without_required_fields() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_requires_endpoint_when_remote_enabled() {
        let mut config = Config::with_llm("https://api.example.com", "key", "gpt-4");
        assert!(config.validate().is_ok());

        config.remote_qa.enabled = true;
        assert!(config.validate().is_err());

        config.remote_qa.url = "https://chatbot.example.com/ask".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let mut config = Config::with_llm("https://api.example.com", "key", "gpt-4");
        config.llm.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(QcError::Config(msg)) if msg.contains("LLM timeout")));

        config.llm.timeout_secs = 120;
        config.remote_qa.enabled = true;
        config.remote_qa.url = "https://chatbot.example.com/ask".to_string();
        config.remote_qa.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(QcError::Config(msg)) if msg.contains("Chatbot timeout")));

        config.remote_qa.timeout_secs = 60;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_with_llm() {
        let config = Config::with_llm("https://api.example.com", "test-key", "gpt-4");
        assert_eq!(config.llm.api_base, "https://api.example.com");
        assert_eq!(config.llm.api_key, "test-key");
        assert_eq!(config.llm.model, "gpt-4");
        assert!(!config.remote_qa.enabled);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("OPENAI_API_KEY", "sk-fallback"),
            ("CHL_API_URL", "https://chatbot.example.com/ask"),
            ("CHL_API_REFERER", "https://chatbot.example.com"),
            ("LLM_TIMEOUT_SECS", "30"),
            ("LLM_MAX_TOKENS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.llm.api_key, "sk-fallback");
        assert_eq!(config.remote_qa.url, "https://chatbot.example.com/ask");
        assert_eq!(config.remote_qa.referer, "https://chatbot.example.com");
        assert_eq!(config.llm.timeout(), Duration::from_secs(30));
        assert_eq!(config.llm.max_tokens, 4096);
    }

    #[test]
    fn test_llm_api_key_wins_over_openai_key() {
        let mut config = Config::default();
        config.apply_env(|key| match key {
            "LLM_API_KEY" => Some("primary".to_string()),
            "OPENAI_API_KEY" => Some("fallback".to_string()),
            _ => None,
        });
        assert_eq!(config.llm.api_key, "primary");
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
llm:
  api_key: sk-test
  model: gpt-4o
remote_qa:
  url: https://chatbot.example.com/ask
  referer: https://chatbot.example.com
pipeline:
  variant_count: 3
  parallel_remote: true
  score_strategy: labeled
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.api_base, "https://api.openai.com");
        assert_eq!(config.remote_qa.url, "https://chatbot.example.com/ask");
        assert_eq!(config.pipeline.variant_count, 3);
        assert!(config.pipeline.parallel_remote);
        assert_eq!(config.pipeline.score_strategy, ScoreStrategy::Labeled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_yaml_rejects_garbage() {
        assert!(Config::from_yaml("llm: [unclosed").is_err());
    }
}
