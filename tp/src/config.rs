//! Trip planner configuration types and loading

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors raised while resolving configuration into usable clients
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{env} environment variable is not set")]
    MissingApiKey { env: String },

    #[error("{env} is malformed: {reason}")]
    MalformedApiKey { env: String, reason: String },

    #[error("Unknown model '{name}'. Available: {available}")]
    UnknownModel { name: String, available: String },

    #[error("Unknown LLM provider: '{0}'. Supported: openai, ollama")]
    UnknownProvider(String),
}

/// Main trip planner configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR); the CLI flag wins
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// LLM backends and request parameters
    pub llm: LlmConfig,

    /// External tool endpoints and credentials
    pub tools: ToolsConfig,

    /// Orchestration loop settings
    pub planner: PlannerConfig,

    /// Prompt template overrides
    pub prompts: PromptsConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .tripplanner.yml
        let local_config = PathBuf::from(".tripplanner.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/tripplanner/tripplanner.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("tripplanner").join("tripplanner.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Any failure is swallowed; the full `load` reports it later.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM configuration: a map of model selectors plus shared request parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Selector used when the trip request does not name one
    pub default: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Model selectors (as shown to the user) mapped to backends
    pub models: BTreeMap<String, ModelConfig>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        let mut models = BTreeMap::new();
        models.insert(
            "gpt-4o-mini".to_string(),
            ModelConfig {
                provider: "openai".to_string(),
                model: "gpt-4o-mini".to_string(),
                api_key_env: Some("OPENAI_API_KEY".to_string()),
                base_url: "https://api.openai.com".to_string(),
                key_prefix: None,
            },
        );
        models.insert(
            "llama2".to_string(),
            ModelConfig {
                provider: "ollama".to_string(),
                model: "llama2".to_string(),
                api_key_env: None,
                base_url: "http://localhost:11434".to_string(),
                key_prefix: None,
            },
        );

        Self {
            default: "gpt-4o-mini".to_string(),
            max_tokens: 2000,
            temperature: 0.7,
            timeout_ms: 300_000,
            models,
        }
    }
}

impl LlmConfig {
    /// Resolve a model selector (or the default) into a flat client config
    pub fn resolve(&self, selector: Option<&str>) -> Result<ResolvedLlmConfig, ConfigError> {
        let name = selector.unwrap_or(&self.default);
        debug!(%name, "LlmConfig::resolve: called");
        let model = self.models.get(name).ok_or_else(|| {
            debug!(%name, "LlmConfig::resolve: unknown selector");
            ConfigError::UnknownModel {
                name: name.to_string(),
                available: self.models.keys().cloned().collect::<Vec<_>>().join(", "),
            }
        })?;

        Ok(ResolvedLlmConfig {
            name: name.to_string(),
            provider: model.provider.clone(),
            model: model.model.clone(),
            api_key_env: model.api_key_env.clone(),
            base_url: model.base_url.trim_end_matches('/').to_string(),
            key_prefix: model.key_prefix.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout_ms: self.timeout_ms,
        })
    }
}

/// One selectable model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Backend: "openai" or "ollama"
    pub provider: String,

    /// Model identifier sent to the backend
    pub model: String,

    /// Environment variable holding the API key (None for keyless backends)
    #[serde(rename = "api-key-env", default)]
    pub api_key_env: Option<String>,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Required key prefix, e.g. "sk-proj-"
    #[serde(rename = "key-prefix", default)]
    pub key_prefix: Option<String>,
}

/// Fully resolved configuration for constructing one LLM client
#[derive(Debug, Clone)]
pub struct ResolvedLlmConfig {
    pub name: String,
    pub provider: String,
    pub model: String,
    pub api_key_env: Option<String>,
    pub base_url: String,
    pub key_prefix: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_ms: u64,
}

impl ResolvedLlmConfig {
    /// Read and check the API key from the environment
    ///
    /// Returns an empty string for backends without a key variable.
    pub fn get_api_key(&self) -> Result<String, ConfigError> {
        match &self.api_key_env {
            Some(env) => read_api_key(env, self.key_prefix.as_deref(), |k| std::env::var(k).ok()),
            None => Ok(String::new()),
        }
    }
}

/// Look up and check an API key through `lookup`
pub fn read_api_key(
    env: &str,
    prefix: Option<&str>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    debug!(%env, "read_api_key: called");
    let key = lookup(env)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ConfigError::MissingApiKey { env: env.to_string() })?;

    if key.trim() != key {
        debug!(%env, "read_api_key: whitespace around key");
        return Err(ConfigError::MalformedApiKey {
            env: env.to_string(),
            reason: "must not contain leading or trailing whitespace".to_string(),
        });
    }

    if let Some(prefix) = prefix
        && !key.starts_with(prefix)
    {
        debug!(%env, %prefix, "read_api_key: prefix mismatch");
        return Err(ConfigError::MalformedApiKey {
            env: env.to_string(),
            reason: format!("must start with '{}'", prefix),
        });
    }

    Ok(key)
}

/// External tool configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub weather: WeatherConfig,
    pub image: ImageConfig,
    pub currency: CurrencyConfig,
}

/// OpenWeatherMap forecast settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    #[serde(rename = "base-url")]
    pub base_url: String,

    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key_env: "OPEN_WEATHER_API_KEY".to_string(),
            base_url: "https://api.openweathermap.org".to_string(),
            timeout_ms: 30_000,
        }
    }
}

/// OpenAI image generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    #[serde(rename = "base-url")]
    pub base_url: String,

    pub model: String,

    pub size: String,

    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com".to_string(),
            model: "dall-e-3".to_string(),
            size: "1024x1024".to_string(),
            timeout_ms: 120_000,
        }
    }
}

/// Abstract exchange-rates settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyConfig {
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    #[serde(rename = "base-url")]
    pub base_url: String,

    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            api_key_env: "ABSTRACT_API_KEY".to_string(),
            base_url: "https://exchange-rates.abstractapi.com".to_string(),
            timeout_ms: 30_000,
        }
    }
}

/// Orchestration loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Follow-up rounds allowed after tools run (1 = two round-trips total)
    #[serde(rename = "max-tool-rounds")]
    pub max_tool_rounds: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self { max_tool_rounds: 1 }
    }
}

/// Prompt template overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Directory with `system.pmt` / `user.pmt` overriding the embedded templates
    pub dir: Option<PathBuf>,
}
