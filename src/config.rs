use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub discord: DiscordConfig,
    #[serde(default = "default_storage_config")]
    pub storage: StorageConfig,
    /// Phrase-to-reply overrides; when absent the built-in table is used.
    #[serde(default)]
    pub replies: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DiscordConfig {
    /// Authorization header value sent with every API request.
    pub token: String,
    /// Channels swept in order, every cycle.
    pub channel_ids: Vec<u64>,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl DiscordConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,
}

fn default_poll_interval_secs() -> u64 {
    2
}

fn default_api_base() -> String {
    "https://discord.com/api/v9".to_string()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("messages.db")
}

fn default_storage_config() -> StorageConfig {
    StorageConfig {
        database_path: default_db_path(),
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }
}
