//! Configuration loading and validation.

use crate::error::{ConfigError, Result};

use anyhow::Context as _;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_PREFIX: &str = "!";

/// Top-level configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Instance root directory (~/.groupmate or GROUPMATE_DIR).
    pub instance_dir: PathBuf,
    pub discord: DiscordConfig,
    pub llm: LlmConfig,
}

/// Discord gateway settings.
#[derive(Debug, Clone)]
pub struct DiscordConfig {
    pub token: String,
    /// Prefix that marks a message as a command.
    pub prefix: String,
    /// Whether to process messages from other bots (self-messages are always ignored).
    pub allow_bot_messages: bool,
}

/// Completion API settings. A missing key selects fallback mode.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub openai_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

#[derive(Deserialize, Default)]
struct TomlConfig {
    #[serde(default)]
    discord: TomlDiscordConfig,
    #[serde(default)]
    llm: TomlLlmConfig,
}

#[derive(Deserialize, Default)]
struct TomlDiscordConfig {
    token: Option<String>,
    prefix: Option<String>,
    #[serde(default)]
    allow_bot_messages: bool,
}

#[derive(Deserialize, Default)]
struct TomlLlmConfig {
    openai_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
}

/// Resolve a value that might be an "env:VAR_NAME" reference.
fn resolve_env_value(value: &str) -> Option<String> {
    if let Some(var_name) = value.strip_prefix("env:") {
        std::env::var(var_name).ok()
    } else {
        Some(value.to_string())
    }
}

/// Load `KEY=value` pairs from a `.env` file into the process environment.
///
/// Variables that are already set keep their value. Returns `false` when the
/// file does not exist.
pub fn load_dotenv(path: &Path) -> Result<bool> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(error) if error.not_found() => Ok(false),
        Err(error) => Err(anyhow::Error::new(error)
            .context(format!("failed to load {}", path.display()))
            .into()),
    }
}

/// Read an environment variable, treating an empty value as unset.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

impl Config {
    /// Resolve the instance directory from env or default (~/.groupmate).
    pub fn default_instance_dir() -> PathBuf {
        std::env::var("GROUPMATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .map(|d| d.join(".groupmate"))
                    .unwrap_or_else(|| PathBuf::from("./.groupmate"))
            })
    }

    /// Load configuration from the default config file, falling back to env vars.
    pub fn load() -> Result<Self> {
        let instance_dir = Self::default_instance_dir();

        let config_path = instance_dir.join("config.toml");
        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::load_from_env(&instance_dir)
        }
    }

    /// Load from a specific TOML config file.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let instance_dir = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        Self::from_toml_str(&content, instance_dir)
    }

    /// Load from environment variables only (no config file).
    pub fn load_from_env(instance_dir: &Path) -> Result<Self> {
        Self::from_toml(TomlConfig::default(), instance_dir.to_path_buf())
    }

    /// Parse and validate a raw TOML string.
    pub fn from_toml_str(content: &str, instance_dir: PathBuf) -> Result<Self> {
        let toml_config: TomlConfig =
            toml::from_str(content).context("failed to parse config TOML")?;
        Self::from_toml(toml_config, instance_dir)
    }

    fn from_toml(toml: TomlConfig, instance_dir: PathBuf) -> Result<Self> {
        let token = toml
            .discord
            .token
            .as_deref()
            .and_then(resolve_env_value)
            .or_else(|| env_var("DISCORD_BOT_TOKEN"))
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::MissingDiscordToken)?;

        let prefix = toml
            .discord
            .prefix
            .unwrap_or_else(|| DEFAULT_PREFIX.to_string());
        if prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix.into());
        }

        // Note: a missing key is allowed. The bot answers in fallback mode.
        let llm = LlmConfig {
            openai_key: toml
                .llm
                .openai_key
                .as_deref()
                .and_then(resolve_env_value)
                .or_else(|| env_var("OPENAI_API_KEY"))
                .filter(|key| !key.trim().is_empty()),
            model: toml
                .llm
                .model
                .as_deref()
                .and_then(resolve_env_value)
                .or_else(|| env_var("OPENAI_MODEL"))
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: toml
                .llm
                .base_url
                .as_deref()
                .and_then(resolve_env_value)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        };

        Ok(Self {
            instance_dir,
            discord: DiscordConfig {
                token,
                prefix,
                allow_bot_messages: toml.discord.allow_bot_messages,
            },
            llm,
        })
    }
}
