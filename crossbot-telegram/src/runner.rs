//! Polling runner: connects the adapter, then feeds every incoming Telegram
//! message through the canonical inbound path, one at a time.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::MessageKind;
use tracing::error;

use crossbot_adapter::ChatAdapter;
use crossbot_core::{DestinationId, InboundKind, Result};

use crate::convert;

/// Whether a group message is addressed to this bot: an `@handle` token,
/// case-insensitive, also matching the `/command@handle` form.
pub fn is_addressed_to(text: &str, bot_handle: &str) -> bool {
    if bot_handle.is_empty() {
        return false;
    }
    let text = text.to_lowercase();
    let needle = format!("@{}", bot_handle.to_lowercase());
    text.match_indices(&needle).any(|(at, matched)| {
        let after = &text[at + matched.len()..];
        after.is_empty() || after.starts_with(char::is_whitespace)
    })
}

/// Connects the adapter and runs the long-polling loop until the process
/// stops. Messages are handled inline so the adapter's inbound path stays
/// sequential.
pub async fn run_polling(adapter: Arc<ChatAdapter>, bot: teloxide::Bot) -> Result<()> {
    adapter.start().await?;
    let bot_handle = adapter.bot_handle().unwrap_or_default();

    teloxide::repl(bot, move |_bot: Bot, message: Message| {
        let adapter = Arc::clone(&adapter);
        let bot_handle = bot_handle.clone();
        async move {
            process_message(&adapter, &bot_handle, message).await;
            Ok(())
        }
    })
    .await;

    Ok(())
}

async fn process_message(adapter: &Arc<ChatAdapter>, bot_handle: &str, message: Message) {
    let destination = DestinationId(message.chat.id.to_string());

    // keep groups clear of join/leave/pin service noise
    if matches!(
        message.kind,
        MessageKind::NewChatMembers(_) | MessageKind::LeftChatMember(_) | MessageKind::Pinned(_)
    ) {
        adapter.discard_inbound(&destination, &message.id.to_string());
        return;
    }

    let Some(update) = convert::update_from(&message) else {
        return;
    };

    // in a group, only messages addressed to the bot are ours
    if let InboundKind::Text { text } = &update.kind {
        if !message.chat.is_private() && !is_addressed_to(text, bot_handle) {
            return;
        }
    }

    if let Err(err) = adapter.handle_update(update).await {
        error!(error = %err, "inbound update failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addressed_plain_mention() {
        assert!(is_addressed_to("hello @MyBot", "mybot"));
        assert!(is_addressed_to("@mybot what's up", "MyBot"));
    }

    #[test]
    fn test_addressed_command_suffix() {
        assert!(is_addressed_to("/ping@mybot", "mybot"));
        assert!(is_addressed_to("/greet@mybot Ada", "mybot"));
    }

    #[test]
    fn test_not_addressed() {
        assert!(!is_addressed_to("hello there", "mybot"));
        assert!(!is_addressed_to("@mybotx hi", "mybot"));
        assert!(!is_addressed_to("@mybot2", "mybot"));
        assert!(!is_addressed_to("anything", ""));
    }
}
