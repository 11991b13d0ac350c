//! Configuration loading.
//!
//! Reads `~/.pdzs/config.toml` (or `$PDZS_CONFIG_PATH`). Environment variables
//! override file values; file values override defaults. A missing file is not
//! an error.
//!
//! Per-channel behavior is not configured here; channel admins manage it with
//! `/pdzs` commands and it lives in the settings database.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::engine::{MessageLimit, MAX_CAPTION_LENGTH, MAX_TEXT_MESSAGE_LENGTH};

/// Environment variable that points at an alternative config file.
pub const CONFIG_PATH_ENV: &str = "PDZS_CONFIG_PATH";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bot connection.
    pub telegram: TelegramConfig,
    /// Settings database.
    pub storage: StorageConfig,
    /// Outgoing message length limits.
    pub limits: LimitsConfig,
}

/// Telegram bot configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Environment variable name holding the bot token.
    pub bot_token_env: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token_env: "PDZS_BOT_TOKEN".to_owned(),
        }
    }
}

/// Settings storage configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database path. `None` means `pdzs.db` in the config directory.
    pub database: Option<PathBuf>,
}

/// Message length limits, in UTF-16 code units.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Longest text message the bot will send.
    pub max_text_length: usize,
    /// Longest caption the bot will send.
    pub max_caption_length: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_text_length: MAX_TEXT_MESSAGE_LENGTH,
            max_caption_length: MAX_CAPTION_LENGTH,
        }
    }
}

impl LimitsConfig {
    /// Configured maximum for `limit`.
    pub fn max_for(&self, limit: MessageLimit) -> usize {
        match limit {
            MessageLimit::Text => self.max_text_length,
            MessageLimit::Caption => self.max_caption_length,
        }
    }
}

impl Config {
    /// Load configuration with precedence: env vars > TOML file > defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be resolved or an
    /// existing config file cannot be read or parsed.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path_with(|key| std::env::var(key).ok())?;
        let mut config = Self::load_from(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from a TOML file only, no env overrides. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                tracing::info!(path = %path.display(), "loading config from file");
                Self::from_toml(&contents)
                    .with_context(|| format!("failed to parse config at {}", path.display()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no config file found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "failed to read config at {}: {e}",
                path.display()
            )),
        }
    }

    /// Parse a TOML string into config.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid TOML for this schema.
    pub fn from_toml(toml_str: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(toml_str).context("failed to parse config TOML")?;
        Ok(config)
    }

    /// Resolve the config file path using a custom env resolver.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn config_path_with(env: impl Fn(&str) -> Option<String>) -> anyhow::Result<PathBuf> {
        if let Some(p) = env(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(p));
        }
        Ok(config_dir()?.join("config.toml"))
    }

    /// Apply environment variable overrides.
    ///
    /// Takes a resolver function so tests need not touch the process environment.
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("PDZS_DATABASE") {
            self.storage.database = Some(PathBuf::from(v));
        }
        if let Some(v) = env("PDZS_BOT_TOKEN_ENV") {
            self.telegram.bot_token_env = v;
        }
    }

    /// Database path, falling back to `pdzs.db` under `paths.root`.
    pub fn database_path(&self, paths: &RuntimePaths) -> PathBuf {
        self.storage
            .database
            .clone()
            .unwrap_or_else(|| paths.database.clone())
    }

    /// Read the bot token from the variable named by `telegram.bot_token_env`.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is unset or blank.
    pub fn bot_token(&self, env: impl Fn(&str) -> Option<String>) -> anyhow::Result<String> {
        let name = &self.telegram.bot_token_env;
        env(name)
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| anyhow::anyhow!("bot token not set: export {name} or add it to .env"))
    }
}

/// Well-known locations under the config directory.
#[derive(Debug, Clone)]
pub struct RuntimePaths {
    /// The config directory itself.
    pub root: PathBuf,
    /// Default config file.
    pub config_file: PathBuf,
    /// Optional `.env` file loaded at startup.
    pub env_file: PathBuf,
    /// Default settings database.
    pub database: PathBuf,
    /// Log directory for the `start` subcommand.
    pub logs_dir: PathBuf,
}

impl RuntimePaths {
    /// Lay out the paths under `root`.
    pub fn under(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config_file: root.join("config.toml"),
            env_file: root.join(".env"),
            database: root.join("pdzs.db"),
            logs_dir: root.join("logs"),
            root,
        }
    }
}

/// Resolve the default config directory (`~/.pdzs/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".pdzs"))
}

/// Paths under the default config directory.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn runtime_paths() -> anyhow::Result<RuntimePaths> {
    Ok(RuntimePaths::under(config_dir()?))
}

/// Load `path` into the process environment if it exists.
///
/// Variables already set in the environment win. Returns whether a file was loaded.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be parsed.
pub fn load_env_file(path: &Path) -> anyhow::Result<bool> {
    match dotenvy::from_path(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "loaded environment file");
            Ok(true)
        }
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(anyhow::anyhow!(
            "failed to load environment file {}: {e}",
            path.display()
        )),
    }
}
