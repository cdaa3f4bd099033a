//! Configuration loading, validation, and management for seomagic.
//!
//! Loads configuration from `~/.seomagic/config.toml` (or an explicit path)
//! with environment variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The default system prompt for the SEO assistant.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are an SEO assistant working inside a Telegram Mini App.

You have access to Just-Magic tools for SEO analysis:
- Query clustering (justmagic_cluster)
- Wordstat frequency collection (justmagic_wordstat_frequency)
- Search suggestion parsing (justmagic_suggestions_parser)
- Page text analysis (justmagic_text_analyzer)
- LSI text analysis (justmagic_aquarelle)
- LSI word generation (justmagic_aquarelle_generator)
- Thematic classification (justmagic_thematic_classifier)
- Query-to-page distribution by markers (justmagic_markers_online)
- Semantics expansion (justmagic_expand_semantics)
- Regular-expression keyword search (justmagic_regex_search)
- Task management (listing tasks, task info, downloading results)

Important:
1. Most tasks run asynchronously: you may queue a task and give the user its ID to track it.
2. Region 213 = Moscow, 2 = Saint Petersburg.
3. Frequencies are collected from Yandex Wordstat.
4. Clustering needs a list of queries (one query per line).

Answer briefly and to the point, in the user's language. Use the tools when an SEO task is requested.
When a task has been queued, tell the user its ID and explain that the result will be ready later.";

/// The root configuration structure.
///
/// Maps directly to `~/.seomagic/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Anthropic API key for the conversational model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic_api_key: Option<String>,

    /// Telegram bot token (only reported by the health endpoint)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_bot_token: Option<String>,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Max tokens per model response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature (provider default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Remote task API settings
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Agent loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".into()
}
fn default_max_tokens() -> u32 {
    4096
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("anthropic_api_key", &redact(&self.anthropic_api_key))
            .field("telegram_bot_token", &redact(&self.telegram_bot_token))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("remote", &self.remote)
            .field("agent", &self.agent)
            .field("gateway", &self.gateway)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Per-call network timeout
    #[serde(default = "default_remote_timeout")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "https://api.just-magic.org/api_v1.php".into()
}
fn default_remote_timeout() -> u64 {
    120
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            timeout_secs: default_remote_timeout(),
        }
    }
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum tool-use cycles per request
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Turns retained per conversation
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_secs: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_max_iterations() -> u32 {
    10
}
fn default_history_limit() -> usize {
    40
}
fn default_tool_timeout() -> u64 {
    150
}
fn default_request_timeout() -> u64 {
    600
}
fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.into()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            history_limit: default_history_limit(),
            tool_timeout_secs: default_tool_timeout(),
            request_timeout_secs: default_request_timeout(),
            system_prompt: default_system_prompt(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory served under `/static`
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// Allowed CORS origins. `["*"]` allows any origin.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8000
}
fn default_static_dir() -> String {
    "static".into()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.seomagic/config.toml),
    /// then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path)
    }

    /// Load from an explicit path, then apply environment overrides.
    ///
    /// Environment variables (highest priority):
    /// - `ANTHROPIC_API_KEY`, `JUSTMAGIC_API_KEY`, `TELEGRAM_BOT_TOKEN`
    /// - `JUSTMAGIC_API_URL`, `SEOMAGIC_MODEL`, `SEOMAGIC_PORT`
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("ANTHROPIC_API_KEY") {
            self.anthropic_api_key = Some(key);
        }
        if let Some(key) = non_empty("JUSTMAGIC_API_KEY") {
            self.remote.api_key = Some(key);
        }
        if let Some(token) = non_empty("TELEGRAM_BOT_TOKEN") {
            self.telegram_bot_token = Some(token);
        }
        if let Some(url) = non_empty("JUSTMAGIC_API_URL") {
            self.remote.api_url = url;
        }
        if let Some(model) = non_empty("SEOMAGIC_MODEL") {
            self.model = model;
        }
        if let Some(port) = non_empty("SEOMAGIC_PORT") {
            match port.parse() {
                Ok(port) => self.gateway.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid SEOMAGIC_PORT"),
            }
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".seomagic")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(t) = self.temperature {
            if !(0.0..=1.0).contains(&t) {
                return Err(ConfigError::ValidationError(
                    "temperature must be between 0.0 and 1.0".into(),
                ));
            }
        }

        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }

        if self.agent.history_limit < 2 {
            return Err(ConfigError::ValidationError(
                "agent.history_limit must be at least 2".into(),
            ));
        }

        if !self.remote.api_url.starts_with("http://") && !self.remote.api_url.starts_with("https://") {
            return Err(ConfigError::ValidationError(
                "remote.api_url must start with http:// or https://".into(),
            ));
        }

        Ok(())
    }

    pub fn has_model_key(&self) -> bool {
        self.anthropic_api_key.is_some()
    }

    pub fn has_remote_key(&self) -> bool {
        self.remote.api_key.is_some()
    }

    /// Generate a default config TOML string (for `seomagic config`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            telegram_bot_token: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: None,
            remote: RemoteConfig::default(),
            agent: AgentConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.model, "claude-sonnet-4-20250514");
        assert_eq!(config.gateway.port, 8000);
        assert_eq!(config.agent.history_limit, 40);
        assert_eq!(config.remote.timeout_secs, 120);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model, config.model);
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.agent.system_prompt, config.agent.system_prompt);
    }

    #[test]
    fn invalid_values_rejected() {
        let config = AppConfig {
            temperature: Some(5.0),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.agent.max_iterations = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.remote.api_url = "ftp://example.com".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.gateway.port, 8000);
        assert!(!config.has_model_key());
    }

    #[test]
    fn file_values_are_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
model = "claude-test"

[remote]
api_key = "jm-key"

[agent]
max_iterations = 3
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.model, "claude-test");
        assert_eq!(config.agent.max_iterations, 3);
        assert_eq!(config.agent.history_limit, 40);
        assert!(config.has_remote_key());
    }

    #[test]
    fn env_overrides_take_priority() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("ANTHROPIC_API_KEY", "sk-ant"),
            ("JUSTMAGIC_API_KEY", "jm"),
            ("SEOMAGIC_PORT", "9001"),
            ("SEOMAGIC_MODEL", ""),
        ]);
        let mut config = AppConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.anthropic_api_key.as_deref(), Some("sk-ant"));
        assert_eq!(config.remote.api_key.as_deref(), Some("jm"));
        assert_eq!(config.gateway.port, 9001);
        // Empty values do not override
        assert_eq!(config.model, "claude-sonnet-4-20250514");
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut config = AppConfig::default();
        config.anthropic_api_key = Some("sk-ant-secret".into());
        config.remote.api_key = Some("jm-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-ant-secret"));
        assert!(!debug.contains("jm-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("api.just-magic.org"));
        assert!(toml_str.contains("8000"));
    }
}
