//! Minimal Telegram config: token, API URL, optional log/status chats, admin
//! allow-list, log file path. Loaded from environment variables.

use anyhow::Result;
use std::env;

use crossbot_adapter::AdapterConfig;
use crossbot_core::DestinationId;

/// Telegram connection and wiring config.
pub struct TelegramConfig {
    pub bot_token: String,
    pub telegram_api_url: Option<String>,
    /// Chat id operator log messages go to.
    pub log_chat: Option<i64>,
    /// Chat id the rolling status message lives in.
    pub status_chat: Option<i64>,
    /// Handles allowed to use admin-only commands; empty admits anyone.
    pub admin_allowlist: Vec<String>,
    pub log_file: Option<String>,
}

impl TelegramConfig {
    /// Loads from environment variables: BOT_TOKEN is required;
    /// TELEGRAM_API_URL (or TELOXIDE_API_URL), TELEGRAM_LOG_CHAT,
    /// TELEGRAM_STATUS_CHAT, TELEGRAM_ADMIN_ALLOWLIST (comma-separated
    /// handles) and LOG_FILE are optional.
    pub fn from_env() -> Result<Self> {
        let bot_token = env::var("BOT_TOKEN").map_err(|_| anyhow::anyhow!("BOT_TOKEN not set"))?;
        let telegram_api_url = env::var("TELEGRAM_API_URL")
            .or_else(|_| env::var("TELOXIDE_API_URL"))
            .ok();
        let log_chat = parse_chat_id("TELEGRAM_LOG_CHAT")?;
        let status_chat = parse_chat_id("TELEGRAM_STATUS_CHAT")?;
        let admin_allowlist = env::var("TELEGRAM_ADMIN_ALLOWLIST")
            .map(|raw| {
                raw.split(',')
                    .map(|h| h.trim().trim_start_matches('@').to_string())
                    .filter(|h| !h.is_empty())
                    .collect()
            })
            .unwrap_or_default();
        let log_file = env::var("LOG_FILE").ok();
        Ok(Self {
            bot_token,
            telegram_api_url,
            log_chat,
            status_chat,
            admin_allowlist,
            log_file,
        })
    }

    /// Constructs with the given token; everything else empty.
    pub fn with_token(bot_token: String) -> Self {
        Self {
            bot_token,
            telegram_api_url: None,
            log_chat: None,
            status_chat: None,
            admin_allowlist: Vec::new(),
            log_file: None,
        }
    }

    /// The adapter-level view of this config.
    pub fn adapter_config(&self) -> AdapterConfig {
        AdapterConfig {
            admin_allowlist: self.admin_allowlist.clone(),
            log_destination: self.log_chat.map(|id| DestinationId(id.to_string())),
            status_destination: self.status_chat.map(|id| DestinationId(id.to_string())),
        }
    }
}

fn parse_chat_id(var: &str) -> Result<Option<i64>> {
    match env::var(var) {
        Err(_) => Ok(None),
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("{var} is not a chat id: {raw}")),
    }
}
