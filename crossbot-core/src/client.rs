//! Opaque platform capability boundary.
//!
//! [`PlatformClient`] is the set of raw calls a chat platform offers; the
//! adapter engine drives it and never sees wire detail. Implementations map
//! to a transport (e.g. Telegram via teloxide); tests substitute an
//! in-memory client.

use async_trait::async_trait;

use crate::command::Command;
use crate::error::Result;
use crate::types::{
    ClientIdentity, CommandSurface, DestinationId, MessageRef, PlatformAccount, RateLimit,
    SendOptions, SentMessage,
};

/// Per-platform capability set. All calls are asynchronous I/O; timeouts are
/// the transport's own.
#[async_trait]
pub trait PlatformClient: Send + Sync + 'static {
    /// Platform name (e.g. "telegram").
    fn platform(&self) -> &str;

    /// The longest message this platform accepts.
    fn max_text_len(&self) -> usize;

    /// Outbound call ceiling for one destination.
    fn rate_limit(&self) -> RateLimit;

    /// How this platform surfaces commands to users.
    fn command_surface(&self) -> CommandSurface;

    /// Connects/authenticates and returns the bot's own identity.
    async fn connect(&self) -> Result<ClientIdentity>;

    /// Sends a text message to a destination.
    async fn send_message(
        &self,
        destination: &DestinationId,
        text: &str,
        options: SendOptions,
    ) -> Result<SentMessage>;

    /// Edits an already-sent message in place.
    async fn edit_message(&self, message: &MessageRef, text: &str) -> Result<SentMessage>;

    /// Deletes a message.
    async fn delete_message(&self, message: &MessageRef) -> Result<()>;

    /// Shows a typing indicator in a destination, where supported.
    async fn show_typing(&self, destination: &DestinationId) -> Result<()>;

    /// Pins a message, optionally with a notification.
    async fn pin_message(&self, message: &MessageRef, notify: bool) -> Result<()>;

    /// Unpins a message.
    async fn unpin_message(&self, message: &MessageRef) -> Result<()>;

    /// Registers the command set with the platform's native surface.
    /// Admin-only commands are scoped to `admin_destinations` where the
    /// platform distinguishes scopes.
    async fn set_commands(
        &self,
        commands: &[Command],
        admin_destinations: &[DestinationId],
    ) -> Result<()>;

    /// The destination to use for a direct message to the given account.
    fn direct_destination(&self, account: &PlatformAccount) -> DestinationId;
}
