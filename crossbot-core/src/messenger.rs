//! The contract a platform adapter exposes to the orchestrator, and the
//! events it produces.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::interaction::Interaction;
use crate::menu::ReplyMenu;
use crate::types::PlatformAccount;

/// Events an adapter raises toward the orchestrator. Delivered over an mpsc
/// channel so the orchestrator owns fan-out order explicitly.
#[derive(Debug)]
pub enum AdapterEvent {
    /// Fired once after connection/authentication.
    FirstReady { platform: String },
    /// A command interaction reached readiness (exactly once per interaction).
    CommandReceived(Arc<Interaction>),
    /// A text interaction arrived.
    TextReceived(Arc<Interaction>),
}

/// Abstraction covering any chat platform the bot system interacts with.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Platform name (e.g. "telegram").
    fn platform(&self) -> &str;

    /// Whether this platform is connected and ready for use.
    fn is_ready(&self) -> bool;

    /// The longest message this platform accepts.
    fn max_text_len(&self) -> usize;

    /// Pushes the command registry to the platform's native surface.
    async fn load_commands(&self) -> Result<()>;

    /// Creates the updateable status message in the status destination, or
    /// updates it if it already exists.
    async fn create_or_update_status(&self, text: &str) -> Result<()>;

    /// Sends a one-off message to the status destination, without replacing
    /// the continually updated status message.
    async fn send_one_time_status(&self, text: &str, notify: bool) -> Result<()>;

    /// Re-creates the updateable status message as the latest message and
    /// replaces the old one with the given text (deleting it when empty).
    async fn replace_status(&self, text: &str) -> Result<()>;

    /// Sends to the baked-in logging system and to this platform's log
    /// destination if one is configured.
    async fn log(&self, message: &str) -> Result<()>;

    /// Sends a reply in an interaction.
    async fn reply(&self, interaction: &Arc<Interaction>, text: &str) -> Result<()>;

    /// Sends a reply that presents menu options.
    async fn reply_with_options(
        &self,
        interaction: &Arc<Interaction>,
        menu: ReplyMenu,
        text: Option<&str>,
    ) -> Result<()>;

    /// Sends a message directly to a specific account.
    async fn send_to_account(&self, account: &PlatformAccount, text: &str) -> Result<()>;

    /// Removes an interaction from this adapter's active set, releasing any
    /// ephemeral affordance it holds.
    async fn remove_interaction(&self, interaction: &Arc<Interaction>) -> Result<()>;
}
