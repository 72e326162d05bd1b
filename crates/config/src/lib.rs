//! Configuration management for agentdesk
//!
//! Loads and saves the JSON config file and applies environment overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod paths;

pub use paths::{config_path, data_dir, interactions_dir};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config not found: {0}")]
    NotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// OpenAI-compatible endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

/// What the dispatch loop does once its iteration budget is spent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EarlyStopping {
    /// Ask the model for one last answer built from the transcript
    #[default]
    Generate,
    /// Stop without another model call
    Force,
}

/// Agent loop parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDefaults {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default)]
    pub early_stopping: EarlyStopping,
    #[serde(default = "default_model_timeout")]
    pub model_timeout_secs: u64,
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_secs: u64,
    /// Write an interaction record for runs that failed in the model
    #[serde(default = "default_record_failures")]
    pub record_failures: bool,
}

impl Default for AgentDefaults {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_iterations: default_max_iterations(),
            early_stopping: EarlyStopping::default(),
            model_timeout_secs: default_model_timeout(),
            tool_timeout_secs: default_tool_timeout(),
            record_failures: default_record_failures(),
        }
    }
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_iterations() -> u32 {
    3
}

fn default_model_timeout() -> u64 {
    30
}

fn default_tool_timeout() -> u64 {
    10
}

fn default_record_failures() -> bool {
    true
}

/// Result cache TTLs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_agent_ttl")]
    pub agent_ttl_secs: u64,
    #[serde(default = "default_rag_ttl")]
    pub rag_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            agent_ttl_secs: default_agent_ttl(),
            rag_ttl_secs: default_rag_ttl(),
        }
    }
}

fn default_agent_ttl() -> u64 {
    1800
}

fn default_rag_ttl() -> u64 {
    3600
}

/// Where interactions are written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_interactions_dir")]
    pub interactions_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            interactions_dir: default_interactions_dir(),
        }
    }
}

fn default_interactions_dir() -> String {
    "~/.agentdesk/interactions".to_string()
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentDefaults,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load from the default location, then apply environment overrides
    pub async fn load() -> Result<Self> {
        let path = config_path();
        let mut config = Self::load_from(&path).await?;
        config.apply_env();
        Ok(config)
    }

    /// Load from specific location
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config found at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        debug!("Reading config from {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save to the default location
    pub async fn save(&self) -> Result<()> {
        let path = config_path();
        self.save_to(&path).await
    }

    /// Save to specific location
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        debug!("Writing config to {:?}", path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Apply `OPENAI_API_KEY`, `OPENAI_BASE_URL` and `AGENTDESK_MODEL`
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("OPENAI_API_KEY").filter(|v| !v.is_empty()) {
            self.provider.api_key = key;
        }
        if let Some(base) = lookup("OPENAI_BASE_URL").filter(|v| !v.is_empty()) {
            self.provider.api_base = Some(base);
        }
        if let Some(model) = lookup("AGENTDESK_MODEL").filter(|v| !v.is_empty()) {
            self.agent.model = model;
        }
    }

    /// Model API key, if any
    pub fn api_key(&self) -> Option<String> {
        if self.provider.api_key.is_empty() {
            None
        } else {
            Some(self.provider.api_key.clone())
        }
    }

    /// Model API base URL
    pub fn api_base(&self) -> Option<String> {
        self.provider
            .api_base
            .clone()
            .filter(|base| !base.is_empty())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    /// Resolved interaction log directory
    pub fn interactions_path(&self) -> PathBuf {
        paths::expand_home(&self.storage.interactions_dir)
    }

    pub fn agent_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.agent_ttl_secs)
    }

    pub fn rag_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.rag_ttl_secs)
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.agent.model_timeout_secs)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.agent.tool_timeout_secs)
    }
}

/// Write a default config and create the interaction directory
pub async fn init() -> Result<Config> {
    let config_path = config_path();

    if config_path.exists() {
        warn!("Config already exists at {:?}", config_path);
    } else {
        let config = Config::default();
        config.save().await?;
        info!("Config written to {:?}", config_path);
    }

    let config = Config::load().await?;
    paths::ensure_dir(&config.interactions_path()).await?;
    info!("Interaction log at {:?}", config.interactions_path());

    Ok(config)
}
