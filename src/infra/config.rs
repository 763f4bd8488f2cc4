//! Configuration loading from TOML files
//!
//! Config file is selected via:
//! 1. --config <path> command line argument
//! 2. CONFIG_FILE environment variable
//! 3. Default: config/dev.toml
//!
//! After the file is read, `PORT`, `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID`
//! from the environment override the corresponding file values.

use anyhow::Context;
use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Used when neither `--config` nor `CONFIG_FILE` names a file
pub const DEFAULT_CONFIG_PATH: &str = "config/dev.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served for `GET` requests outside the API routes
    #[serde(default = "default_public_dir")]
    pub public_dir: String,
    /// Take the visitor address from `X-Forwarded-For` (behind a reverse proxy)
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            public_dir: default_public_dir(),
            trust_forwarded_for: false,
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_public_dir() -> String {
    "public".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            api_base: default_api_base(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// Offset of the site owner's zone, used to render visit times
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self { utc_offset_minutes: default_utc_offset_minutes() }
    }
}

fn default_utc_offset_minutes() -> i32 {
    120 // Kyiv standard time
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// Main configuration struct used throughout the application
#[derive(Clone)]
pub struct Config {
    bind_address: String,
    port: u16,
    public_dir: PathBuf,
    trust_forwarded_for: bool,
    bot_token: Option<String>,
    chat_id: Option<String>,
    telegram_api_base: String,
    telegram_timeout_ms: u64,
    utc_offset_minutes: i32,
    config_file: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("port", &self.port)
            .field("public_dir", &self.public_dir)
            .field("trust_forwarded_for", &self.trust_forwarded_for)
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("chat_id", &self.chat_id)
            .field("telegram_api_base", &self.telegram_api_base)
            .field("telegram_timeout_ms", &self.telegram_timeout_ms)
            .field("utc_offset_minutes", &self.utc_offset_minutes)
            .field("config_file", &self.config_file)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default(), "default".to_string())
    }
}

/// Empty or whitespace-only settings count as absent
fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl Config {
    fn from_toml(toml_config: TomlConfig, config_file: String) -> Self {
        Self {
            bind_address: toml_config.server.bind_address,
            port: toml_config.server.port,
            public_dir: PathBuf::from(toml_config.server.public_dir),
            trust_forwarded_for: toml_config.server.trust_forwarded_for,
            bot_token: non_empty(toml_config.telegram.bot_token),
            chat_id: non_empty(toml_config.telegram.chat_id),
            telegram_api_base: toml_config.telegram.api_base,
            telegram_timeout_ms: toml_config.telegram.timeout_ms,
            utc_offset_minutes: toml_config.notify.utc_offset_minutes,
            config_file,
        }
    }

    /// Config file path: the `--config` value, then `CONFIG_FILE`, then
    /// `config/dev.toml`. Blank values are skipped.
    pub fn resolve_config_path(
        cli_path: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> String {
        cli_path
            .map(str::to_string)
            .and_then(non_empty)
            .or_else(|| lookup("CONFIG_FILE").and_then(non_empty))
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let toml_config: TomlConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Self::from_toml(toml_config, path.display().to_string()))
    }

    /// Resolve the path from `--config`/`CONFIG_FILE` and load it
    pub fn load(cli_path: Option<&str>) -> Self {
        Self::load_from_path(&Self::resolve_config_path(cli_path, |key| env::var(key).ok()))
    }

    /// Load configuration from an explicit path, falling back to defaults.
    /// Environment overrides are applied in both cases.
    pub fn load_from_path(path: &str) -> Self {
        let config = match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "config_load_failed_using_defaults");
                Self::default()
            }
        };
        config.with_env_overrides(|key| env::var(key).ok())
    }

    /// Apply `PORT`, `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID` overrides.
    /// The lookup is injected so tests don't touch the process environment.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(port) = lookup("PORT").and_then(|p| p.trim().parse::<u16>().ok()) {
            self.port = port;
        }
        if let Some(token) = lookup("TELEGRAM_BOT_TOKEN") {
            self.bot_token = non_empty(token);
        }
        if let Some(chat_id) = lookup("TELEGRAM_CHAT_ID") {
            self.chat_id = non_empty(chat_id);
        }
        self
    }

    /// Token and chat id, only when both are present
    pub fn telegram_credentials(&self) -> Option<(&str, &str)> {
        match (self.bot_token.as_deref(), self.chat_id.as_deref()) {
            (Some(token), Some(chat_id)) => Some((token, chat_id)),
            _ => None,
        }
    }

    /// Owner zone for rendering timestamps; out-of-range offsets fall back to UTC
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix())
    }

    // Getters for all config fields
    pub fn bind_address(&self) -> &str {
        &self.bind_address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn public_dir(&self) -> &Path {
        &self.public_dir
    }

    pub fn trust_forwarded_for(&self) -> bool {
        self.trust_forwarded_for
    }

    pub fn telegram_api_base(&self) -> &str {
        &self.telegram_api_base
    }

    pub fn telegram_timeout_ms(&self) -> u64 {
        self.telegram_timeout_ms
    }

    pub fn utc_offset_minutes(&self) -> i32 {
        self.utc_offset_minutes
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Builder method for tests to set credentials
    #[cfg(test)]
    pub fn with_credentials(mut self, token: &str, chat_id: &str) -> Self {
        self.bot_token = non_empty(token.to_string());
        self.chat_id = non_empty(chat_id.to_string());
        self
    }
}
