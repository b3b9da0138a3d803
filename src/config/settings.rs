//! Configuration settings for Sleuth.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub memory: MemorySettings,
    pub agent: AgentSettings,
    pub search: SearchSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.sleuth".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Chat completion endpoint settings.
///
/// Any OpenAI-compatible endpoint works; the default points at Groq.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Base URL of the OpenAI-compatible API.
    pub api_base: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Model used for classification, planning, reasoning and synthesis.
    pub model: String,
    /// Per-request timeout.
    pub timeout_seconds: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.groq.com/openai/v1".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            timeout_seconds: 120,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub api_base: String,
    pub api_key_env: String,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions. The memory store is built for 384.
    pub dimensions: u32,
    pub timeout_seconds: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 384,
            timeout_seconds: 60,
        }
    }
}

/// Memory store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemorySettings {
    /// Persist the store to SQLite. When false the store lives in memory only.
    pub persist: bool,
    /// Path to the SQLite database.
    pub sqlite_path: String,
    /// Words per chunk.
    pub chunk_words: usize,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            persist: true,
            sqlite_path: "~/.sleuth/memory.db".to_string(),
            chunk_words: 500,
        }
    }
}

/// Reasoning loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Hard cap on decision iterations per run.
    pub max_iterations: usize,
    /// Timeout applied to each tool invocation.
    pub tool_timeout_seconds: u64,
    /// Ask the planner for a step list before the loop starts.
    pub plan_first: bool,
    /// Number of chunks retrieved for the final report.
    pub retrieve_k: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            tool_timeout_seconds: 60,
            plan_first: false,
            retrieve_k: 5,
        }
    }
}

/// Web search and fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Maximum URLs returned by a single web search.
    pub max_results: usize,
    /// User-Agent sent with search and fetch requests.
    pub user_agent: String,
    pub timeout_seconds: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_results: 5,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            timeout_seconds: 15,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sleuth")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.memory.sqlite_path)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.agent.tool_timeout_seconds)
    }

    /// Read the LLM API key from the configured environment variable.
    pub fn llm_api_key(&self) -> crate::error::Result<String> {
        read_key(&self.llm.api_key_env)
    }

    /// Read the embedding API key from the configured environment variable.
    pub fn embedding_api_key(&self) -> crate::error::Result<String> {
        read_key(&self.embedding.api_key_env)
    }
}

fn read_key(var: &str) -> crate::error::Result<String> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        Ok(_) => Err(crate::error::SleuthError::Config(format!(
            "{var} is empty. Set it with: export {var}='...'"
        ))),
        Err(_) => Err(crate::error::SleuthError::Config(format!(
            "{var} is not set. Set it with: export {var}='...'"
        ))),
    }
}
