use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Telegram bot token from @BotFather
    pub bot_token: String,

    /// Channel the bot posts new entries to, e.g. "@mychannel" or "-1001234567890"
    pub channel_id: String,

    /// Password for the /login admin command
    pub admin_password: String,

    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_minutes: u64,

    #[serde(default = "default_send_delay")]
    pub send_delay_seconds: u64,

    #[serde(default = "default_recovery_delay")]
    pub recovery_delay_seconds: u64,

    /// Admin sessions expire after this many minutes; absent means they never expire
    #[serde(default)]
    pub session_ttl_minutes: Option<u64>,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("feedrelay");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("feeds.db").to_string_lossy().to_string()
}

fn default_poll_interval() -> u64 {
    15
}

fn default_send_delay() -> u64 {
    2
}

fn default_recovery_delay() -> u64 {
    60
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AppError::Config(format!(
                "config file not found at {:?}; create it with bot_token, channel_id and admin_password",
                path
            )));
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| AppError::Config(e.to_string()))?;
        Ok(config)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("feedrelay")
            .join("config.toml")
    }
}
