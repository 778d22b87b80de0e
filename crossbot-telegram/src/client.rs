//! Teloxide-backed [`PlatformClient`]. Thin: every method maps one canonical
//! call to one Telegram API call; pacing and fallbacks live upstream in the
//! dispatch channel.

use std::time::Duration;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{
    BotCommand, BotCommandScope, ChatAction, ChatId, KeyboardButton, KeyboardMarkup, MessageId,
    Recipient, ReplyMarkup, ReplyParameters,
};

use crossbot_core::{
    ClientIdentity, Command, CommandSurface, CrossbotError, DestinationId, MessageRef,
    PlatformAccount, PlatformClient, RateLimit, Result, SendOptions, SentMessage,
};

use crate::config::TelegramConfig;

/// Telegram's message length ceiling.
const MAX_TEXT_LENGTH: usize = 4096;
/// Telegram allows roughly 20 messages per minute into one group.
const RATE_WINDOW: Duration = Duration::from_secs(60);
const RATE_MAX_CALLS: u32 = 20;

pub struct TelegramClient {
    bot: teloxide::Bot,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let mut bot = teloxide::Bot::new(config.bot_token.clone());
        if let Some(url) = &config.telegram_api_url {
            let url = url
                .parse()
                .map_err(|_| CrossbotError::Config(format!("invalid api url: {url}")))?;
            bot = bot.set_api_url(url);
        }
        Ok(Self { bot })
    }

    /// The underlying teloxide bot, for the polling runner.
    pub fn bot(&self) -> &teloxide::Bot {
        &self.bot
    }
}

fn chat_id(destination: &DestinationId) -> Result<ChatId> {
    destination
        .0
        .parse::<i64>()
        .map(ChatId)
        .map_err(|_| CrossbotError::Platform(format!("not a telegram chat id: {destination}")))
}

fn message_id(raw: &str) -> Result<MessageId> {
    raw.parse::<i32>()
        .map(MessageId)
        .map_err(|_| CrossbotError::Platform(format!("not a telegram message id: {raw}")))
}

fn platform_err(err: teloxide::RequestError) -> CrossbotError {
    CrossbotError::Platform(err.to_string())
}

#[async_trait]
impl PlatformClient for TelegramClient {
    fn platform(&self) -> &str {
        "telegram"
    }

    fn max_text_len(&self) -> usize {
        MAX_TEXT_LENGTH
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            window: RATE_WINDOW,
            max_calls: RATE_MAX_CALLS,
        }
    }

    fn command_surface(&self) -> CommandSurface {
        CommandSurface::FreeText
    }

    async fn connect(&self) -> Result<ClientIdentity> {
        let me = self.bot.get_me().await.map_err(platform_err)?;
        Ok(ClientIdentity {
            name: me.user.first_name.clone(),
            handle: me.user.username.clone().unwrap_or_default(),
        })
    }

    async fn send_message(
        &self,
        destination: &DestinationId,
        text: &str,
        options: SendOptions,
    ) -> Result<SentMessage> {
        let chat = chat_id(destination)?;
        let mut request = self.bot.send_message(chat, text.to_string());
        if let Some(reply_to) = &options.reply_to {
            request = request.reply_parameters(ReplyParameters::new(message_id(reply_to)?));
        }
        if let Some(buttons) = &options.buttons {
            let row: Vec<KeyboardButton> = buttons
                .iter()
                .map(|label| KeyboardButton::new(label.clone()))
                .collect();
            let keyboard = KeyboardMarkup::new(vec![row])
                .resize_keyboard()
                .one_time_keyboard()
                .selective();
            request = request.reply_markup(ReplyMarkup::Keyboard(keyboard));
        }
        if options.disable_notification {
            request = request.disable_notification(true);
        }
        let sent = request.await.map_err(platform_err)?;
        Ok(SentMessage {
            message: MessageRef {
                destination: destination.clone(),
                id: sent.id.to_string(),
            },
        })
    }

    async fn edit_message(&self, message: &MessageRef, text: &str) -> Result<SentMessage> {
        let chat = chat_id(&message.destination)?;
        let id = message_id(&message.id)?;
        let edited = self
            .bot
            .edit_message_text(chat, id, text.to_string())
            .await
            .map_err(platform_err)?;
        Ok(SentMessage {
            message: MessageRef {
                destination: message.destination.clone(),
                id: edited.id.to_string(),
            },
        })
    }

    async fn delete_message(&self, message: &MessageRef) -> Result<()> {
        let chat = chat_id(&message.destination)?;
        self.bot
            .delete_message(chat, message_id(&message.id)?)
            .await
            .map_err(platform_err)?;
        Ok(())
    }

    async fn show_typing(&self, destination: &DestinationId) -> Result<()> {
        self.bot
            .send_chat_action(chat_id(destination)?, ChatAction::Typing)
            .await
            .map_err(platform_err)?;
        Ok(())
    }

    async fn pin_message(&self, message: &MessageRef, notify: bool) -> Result<()> {
        let chat = chat_id(&message.destination)?;
        self.bot
            .pin_chat_message(chat, message_id(&message.id)?)
            .disable_notification(!notify)
            .await
            .map_err(platform_err)?;
        Ok(())
    }

    async fn unpin_message(&self, message: &MessageRef) -> Result<()> {
        let chat = chat_id(&message.destination)?;
        self.bot
            .unpin_chat_message(chat)
            .message_id(message_id(&message.id)?)
            .await
            .map_err(platform_err)?;
        Ok(())
    }

    /// Non-admin commands surface in everyone's private chats; admin-only
    /// commands surface only to administrators of the given chats.
    async fn set_commands(
        &self,
        commands: &[Command],
        admin_destinations: &[DestinationId],
    ) -> Result<()> {
        let to_bot_command =
            |c: &Command| BotCommand::new(c.name().to_string(), c.description().to_string());
        let user_commands: Vec<BotCommand> = commands
            .iter()
            .filter(|c| !c.admin_only())
            .map(to_bot_command)
            .collect();
        let admin_commands: Vec<BotCommand> = commands
            .iter()
            .filter(|c| c.admin_only())
            .map(to_bot_command)
            .collect();

        if !admin_commands.is_empty() {
            for destination in admin_destinations {
                self.bot
                    .set_my_commands(admin_commands.clone())
                    .scope(BotCommandScope::ChatAdministrators {
                        chat_id: Recipient::Id(chat_id(destination)?),
                    })
                    .await
                    .map_err(platform_err)?;
            }
        }
        self.bot
            .set_my_commands(user_commands)
            .scope(BotCommandScope::AllPrivateChats)
            .await
            .map_err(platform_err)?;
        Ok(())
    }

    /// A Telegram DM chat shares the account's numeric id.
    fn direct_destination(&self, account: &PlatformAccount) -> DestinationId {
        DestinationId(account.id.0.clone())
    }
}
