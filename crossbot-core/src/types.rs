//! Canonical types shared across platforms: destinations, accounts, message
//! references, inbound updates, and outbound call options.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One addressable chat surface (DM, group, broadcast channel) on one platform.
/// Ids are platform-native, carried as strings so every platform's scheme fits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DestinationId(pub String);

impl fmt::Display for DestinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A platform-native account id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Reference to one physical message in one destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub destination: DestinationId,
    pub id: String,
}

/// Read-only projection of a platform account: who sent something.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformAccount {
    /// Name of the platform this account lives on (e.g. "telegram").
    pub platform: String,
    pub id: AccountId,
    /// Display name.
    pub name: String,
    /// At-style handle without the leading marker, if the account has one.
    pub handle: Option<String>,
}

/// Where an interaction came from: the platform, the raw message reference,
/// and the originating account.
#[derive(Debug, Clone)]
pub struct InteractionSource {
    pub account: PlatformAccount,
    pub message: MessageRef,
    /// Raw text of the originating message.
    pub text: String,
}

impl InteractionSource {
    pub fn platform(&self) -> &str {
        &self.account.platform
    }

    pub fn message_id(&self) -> &str {
        &self.message.id
    }

    pub fn destination(&self) -> &DestinationId {
        &self.message.destination
    }

    pub fn username(&self) -> &str {
        &self.account.name
    }
}

/// Maximum outbound calls one destination may make within a rolling window.
#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    pub window: Duration,
    pub max_calls: u32,
}

/// How a platform surfaces commands to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSurface {
    /// Commands are registered with the platform and arrive pre-parsed; an
    /// unknown invocation is an error.
    Fixed,
    /// Commands are plain text with slash-like syntax; an unknown invocation
    /// silently degrades to text.
    FreeText,
}

/// Options for one outbound send call.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// Message id in the same destination to reply to.
    pub reply_to: Option<String>,
    /// Labels for one-tap choice buttons, where the platform has them.
    pub buttons: Option<Vec<String>>,
    pub disable_notification: bool,
}

/// What a successful outbound send/edit call yields.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub message: MessageRef,
}

/// Identity of the connected bot account, learned at connect time.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    pub name: String,
    /// The bot's own handle; used to spot commands addressed to other bots.
    pub handle: String,
}

/// One canonical inbound event, already stripped of platform wire detail.
#[derive(Debug, Clone)]
pub struct InboundUpdate {
    pub destination: DestinationId,
    pub message_id: String,
    /// Absent for destination-level events such as migration.
    pub account: Option<PlatformAccount>,
    pub kind: InboundKind,
}

#[derive(Debug, Clone)]
pub enum InboundKind {
    /// Plain text (which may still carry free-text command syntax).
    Text { text: String },
    /// A pre-parsed command invocation from a fixed command surface.
    Command {
        name: String,
        args: HashMap<String, String>,
    },
    /// The destination's identity changed (e.g. a group upgrade).
    Migration { new_destination: DestinationId },
}

/// Shortens text to within a platform's message length, marking the cut with
/// an ellipsis. Cuts on a char boundary.
pub fn truncate(text: &str, max_len: usize) -> String {
    let limit = max_len.saturating_sub(5);
    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_untouched() {
        assert_eq!(truncate("hello", 4096), "hello");
    }

    #[test]
    fn test_truncate_long_text_cut_with_ellipsis() {
        let text = "x".repeat(50);
        let cut = truncate(&text, 20);
        assert_eq!(cut, format!("{}...", "x".repeat(15)));
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        let text = "ノ".repeat(20); // 3 bytes each
        let cut = truncate(&text, 12); // limit 7 lands mid-char, walks back to 6
        assert_eq!(cut, "ノノ...");
    }
}
