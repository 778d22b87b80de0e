//! Conversion from Telegram (teloxide) types to the canonical inbound model.

use crossbot_core::{AccountId, DestinationId, InboundKind, InboundUpdate, PlatformAccount};

/// Projects a Telegram user onto a canonical platform account.
pub fn account_from(user: &teloxide::types::User) -> PlatformAccount {
    let name = match &user.last_name {
        Some(last) => format!("{} {}", user.first_name, last),
        None => user.first_name.clone(),
    };
    PlatformAccount {
        platform: "telegram".to_string(),
        id: AccountId(user.id.0.to_string()),
        name,
        handle: user.username.clone(),
    }
}

/// Converts one Telegram message to a canonical inbound update. Returns None
/// for messages the middleware has no use for (no sender, no text).
pub fn update_from(message: &teloxide::types::Message) -> Option<InboundUpdate> {
    let destination = DestinationId(message.chat.id.to_string());

    if let Some(new_id) = message.migrate_to_chat_id() {
        return Some(InboundUpdate {
            destination,
            message_id: message.id.to_string(),
            account: None,
            kind: InboundKind::Migration {
                new_destination: DestinationId(new_id.to_string()),
            },
        });
    }

    let from = message.from.as_ref()?;
    let text = message.text()?;
    Some(InboundUpdate {
        destination,
        message_id: message.id.to_string(),
        account: Some(account_from(from)),
        kind: InboundKind::Text {
            text: text.to_string(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_from_full_name() {
        let user = teloxide::types::User {
            id: teloxide::types::UserId(123),
            is_bot: false,
            first_name: "Ada".to_string(),
            last_name: Some("Lovelace".to_string()),
            username: Some("ada".to_string()),
            language_code: None,
            is_premium: false,
            added_to_attachment_menu: false,
        };
        let account = account_from(&user);
        assert_eq!(account.platform, "telegram");
        assert_eq!(account.id, AccountId("123".to_string()));
        assert_eq!(account.name, "Ada Lovelace");
        assert_eq!(account.handle.as_deref(), Some("ada"));
    }

    #[test]
    fn test_account_from_first_name_only() {
        let user = teloxide::types::User {
            id: teloxide::types::UserId(5),
            is_bot: false,
            first_name: "Ada".to_string(),
            last_name: None,
            username: None,
            language_code: None,
            is_premium: false,
            added_to_attachment_menu: false,
        };
        let account = account_from(&user);
        assert_eq!(account.name, "Ada");
        assert_eq!(account.handle, None);
    }
}
