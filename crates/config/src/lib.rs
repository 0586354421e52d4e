//! Configuration loading and validation for Colloquy.
//!
//! Loads configuration from `~/.colloquy/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Token counter algorithm names accepted by `[run] token_counter`.
pub const KNOWN_TOKEN_COUNTERS: &[&str] = &["char_heuristic", "words"];

/// The root configuration structure.
///
/// Maps directly to `~/.colloquy/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Model selection
    #[serde(default)]
    pub model: ModelConfig,

    /// Run loop configuration
    #[serde(default)]
    pub run: RunConfig,

    /// MCP integration configuration
    #[serde(default)]
    pub mcp: McpConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            run: RunConfig::default(),
            mcp: McpConfig::default(),
        }
    }
}

/// Default model used for threads that do not pin one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model")]
    pub default_model: String,
}

fn default_model() -> String {
    "anthropic/claude-sonnet-4".into()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
        }
    }
}

/// Run loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Maximum loop iterations per run
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Token budget for the trimmed inference window
    #[serde(default = "default_context_budget")]
    pub context_budget_tokens: usize,

    /// Tool results longer than this are truncated with a notice
    #[serde(default = "default_tool_result_cap")]
    pub tool_result_max_chars: usize,

    /// Token counting algorithm: "char_heuristic" or "words"
    #[serde(default = "default_token_counter")]
    pub token_counter: String,
}

fn default_max_iterations() -> u32 {
    20
}
fn default_context_budget() -> usize {
    128_000
}
fn default_tool_result_cap() -> usize {
    20_000
}
fn default_token_counter() -> String {
    "char_heuristic".into()
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            context_budget_tokens: default_context_budget(),
            tool_result_max_chars: default_tool_result_cap(),
            token_counter: default_token_counter(),
        }
    }
}

/// MCP integration configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpConfig {
    /// Per-request timeout enforced by the MCP collaborator
    #[serde(default = "default_mcp_timeout")]
    pub request_timeout_secs: u64,
}

fn default_mcp_timeout() -> u64 {
    30
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_mcp_timeout(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.colloquy/config.toml).
    ///
    /// Environment variable overrides (highest priority):
    /// - `COLLOQUY_MODEL` — default model
    /// - `COLLOQUY_MAX_ITERATIONS` — run iteration cap
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(model) = std::env::var("COLLOQUY_MODEL") {
            config.model.default_model = model;
        }

        if let Ok(max) = std::env::var("COLLOQUY_MAX_ITERATIONS") {
            config.run.max_iterations = max.parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "COLLOQUY_MAX_ITERATIONS must be an integer, got '{max}'"
                ))
            })?;
        }

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

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".colloquy")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "run.max_iterations must be at least 1".into(),
            ));
        }

        if self.run.context_budget_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "run.context_budget_tokens must be greater than 0".into(),
            ));
        }

        if self.run.tool_result_max_chars == 0 {
            return Err(ConfigError::ValidationError(
                "run.tool_result_max_chars must be greater than 0".into(),
            ));
        }

        if !KNOWN_TOKEN_COUNTERS.contains(&self.run.token_counter.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "run.token_counter must be one of {:?}, got '{}'",
                KNOWN_TOKEN_COUNTERS, self.run.token_counter
            )));
        }

        if self.mcp.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "mcp.request_timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for onboarding).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
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

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}
