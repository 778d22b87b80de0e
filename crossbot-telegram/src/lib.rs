//! # crossbot-telegram
//!
//! Telegram layer for the crossbot middleware: a teloxide-backed
//! [`crossbot_core::PlatformClient`], conversion from Telegram updates to the
//! canonical inbound model, minimal env config, and the polling runner.
//! Telegram is a free-text command surface: users can type any slash text,
//! so unknown commands degrade to plain text upstream.

mod client;
mod config;
mod convert;
mod runner;

use std::sync::Arc;

use tokio::sync::mpsc;

use crossbot_adapter::ChatAdapter;
use crossbot_core::{AdapterEvent, CommandRegistry, Result};

pub use client::TelegramClient;
pub use config::TelegramConfig;
pub use convert::{account_from, update_from};
pub use runner::{is_addressed_to, run_polling};

/// Builds the Telegram adapter and the teloxide bot handle it polls with.
/// The adapter is not connected yet; [`run_polling`] does that.
pub fn build(
    config: &TelegramConfig,
    registry: Arc<CommandRegistry>,
    events: mpsc::UnboundedSender<AdapterEvent>,
) -> Result<(Arc<ChatAdapter>, teloxide::Bot)> {
    let client = TelegramClient::new(config)?;
    let bot = client.bot().clone();
    let adapter = ChatAdapter::new(Arc::new(client), registry, config.adapter_config(), events);
    Ok((adapter, bot))
}
