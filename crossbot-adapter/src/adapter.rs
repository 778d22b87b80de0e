//! The adapter engine: one [`ChatAdapter`] per connected platform.
//!
//! Inbound updates arrive on a single path per adapter (platform event
//! delivery is serialized per connection); outbound calls all go through the
//! per-destination dispatch channels. Active interactions live in an explicit
//! map keyed by (account id, destination id).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crossbot_core::{
    truncate, AccountId, AdapterEvent, ClientIdentity, CommandRegistry, DestinationId,
    InboundKind, InboundUpdate, Interaction, InteractionSource, MenuChoice, Messenger, MessageRef,
    PlatformAccount, PlatformClient, ReplyMenu, Result,
};
use crossbot_dispatch::Channel;

use crate::config::AdapterConfig;
use crate::factory::{classify, Classification};

const ADMIN_REFUSAL: &str = "Sorry, only specified admins can use that command";
const MENU_APOLOGY: &str = "Well I wasn't expecting that";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ActiveKey {
    account: AccountId,
    destination: DestinationId,
}

impl ActiveKey {
    fn for_interaction(interaction: &Interaction) -> Self {
        Self {
            account: interaction.source().account.id.clone(),
            destination: interaction.source().destination().clone(),
        }
    }
}

#[derive(Debug, Clone)]
struct StatusMessage {
    id: String,
    text: String,
}

/// Drives one platform through its [`PlatformClient`] capability set and
/// exposes the [`Messenger`] contract to the orchestrator.
pub struct ChatAdapter {
    client: Arc<dyn PlatformClient>,
    registry: Arc<CommandRegistry>,
    config: AdapterConfig,
    events: mpsc::UnboundedSender<AdapterEvent>,
    ready: AtomicBool,
    identity: Mutex<Option<ClientIdentity>>,
    channels: Mutex<HashMap<DestinationId, Channel>>,
    active: Mutex<HashMap<ActiveKey, Arc<Interaction>>>,
    status_destination: Mutex<Option<DestinationId>>,
    status: Arc<Mutex<Option<StatusMessage>>>,
    /// Handle to the owning Arc, for stamping new interactions with their messenger.
    self_ref: Weak<ChatAdapter>,
}

impl ChatAdapter {
    pub fn new(
        client: Arc<dyn PlatformClient>,
        registry: Arc<CommandRegistry>,
        config: AdapterConfig,
        events: mpsc::UnboundedSender<AdapterEvent>,
    ) -> Arc<Self> {
        let status_destination = config.status_destination.clone();
        Arc::new_cyclic(|self_ref| Self {
            client,
            registry,
            config,
            events,
            ready: AtomicBool::new(false),
            identity: Mutex::new(None),
            channels: Mutex::new(HashMap::new()),
            active: Mutex::new(HashMap::new()),
            status_destination: Mutex::new(status_destination),
            status: Arc::new(Mutex::new(None)),
            self_ref: self_ref.clone(),
        })
    }

    /// Connects the platform client, records the bot's identity, and raises
    /// the one first-ready event.
    pub async fn start(&self) -> Result<()> {
        let identity = self.client.connect().await?;
        info!(
            platform = self.client.platform(),
            handle = %identity.handle,
            "platform connected"
        );
        *self.identity.lock().unwrap() = Some(identity);
        self.ready.store(true, Ordering::SeqCst);
        self.emit(AdapterEvent::FirstReady {
            platform: self.client.platform().to_string(),
        });
        Ok(())
    }

    /// The connected bot account's handle, once [`start`](Self::start) ran.
    pub fn bot_handle(&self) -> Option<String> {
        self.identity.lock().unwrap().as_ref().map(|i| i.handle.clone())
    }

    /// Deletes an inbound message the bot wants gone (e.g. join/leave service
    /// noise), through the destination's paced queue.
    pub fn discard_inbound(&self, destination: &DestinationId, message_id: &str) {
        self.channel_for(destination).delete(message_id.to_string());
    }

    /// Handles one canonical inbound update. This is the adapter's single
    /// inbound path; the platform runner calls it sequentially.
    pub async fn handle_update(&self, update: InboundUpdate) -> Result<()> {
        if let InboundKind::Migration { new_destination } = &update.kind {
            return self.handle_migration(&update.destination, new_destination).await;
        }

        let Some(account) = update.account.clone() else {
            return Ok(());
        };
        // interactions constructed here must carry a handle back to us
        let Some(messenger) = self.self_ref.upgrade() else {
            return Ok(());
        };
        let messenger: Arc<dyn Messenger> = messenger;

        let key = ActiveKey {
            account: account.id.clone(),
            destination: update.destination.clone(),
        };
        let existing = self.active.lock().unwrap().get(&key).cloned();

        // An in-progress command interaction consumes plain follow-up text;
        // a fresh invocation supersedes it instead, but only once the new
        // interaction actually constructs.
        let mut stale = None;
        if let Some(existing) = existing {
            if existing.command().is_some() {
                if let InboundKind::Text { text } = &update.kind {
                    let text = text.trim();
                    if !text.is_empty() && !text.starts_with('/') {
                        return self.continue_interaction(&existing, &update, text).await;
                    }
                }
                stale = Some(existing);
            }
        }

        let surface = self.client.command_surface();
        let own_handle = self.bot_handle().unwrap_or_default();
        let classification = classify(&self.registry, &update.kind, surface, &own_handle)?;

        let text = match &update.kind {
            InboundKind::Text { text } => text.clone(),
            _ => String::new(),
        };
        let source = InteractionSource {
            account: account.clone(),
            message: MessageRef {
                destination: update.destination.clone(),
                id: update.message_id.clone(),
            },
            text,
        };

        match classification {
            Classification::Ignore => Ok(()),
            Classification::Text => {
                let interaction = Interaction::new_text(source, messenger);
                if let Some(stale) = stale {
                    stale.end().await?;
                }
                self.active.lock().unwrap().insert(key, Arc::clone(&interaction));
                self.channel_for(&update.destination).typing();
                self.emit(AdapterEvent::TextReceived(interaction));
                Ok(())
            }
            Classification::Command {
                command,
                initial_fields,
            } => {
                let interaction =
                    Interaction::new_command(source, messenger, command.clone(), initial_fields);
                if let Some(stale) = stale {
                    stale.end().await?;
                }
                self.active.lock().unwrap().insert(key, Arc::clone(&interaction));
                self.channel_for(&update.destination).typing();

                // admin gating runs before the command-received notification
                if command.admin_only() && !self.is_admin(account.handle.as_deref()) {
                    self.queue_reply(&interaction, ADMIN_REFUSAL, false);
                    interaction.end().await?;
                    return Ok(());
                }

                if interaction.take_ready_notification() {
                    self.emit(AdapterEvent::CommandReceived(interaction));
                } else {
                    self.send_follow_up(&interaction);
                }
                Ok(())
            }
        }
    }

    /// A later message from an account with an in-progress command
    /// interaction: a menu choice, or the answer to the outstanding field.
    async fn continue_interaction(
        &self,
        interaction: &Arc<Interaction>,
        update: &InboundUpdate,
        text: &str,
    ) -> Result<()> {
        if interaction.is_processing() {
            // they jumped the gun while a reply was in flight
            return Ok(());
        }

        if let Some(menu) = interaction.menu() {
            let choice = if menu.is_numbered() {
                // anything that is not a displayed position is unusable
                match text.parse::<usize>().map(|i| menu.key_at(i).map(str::to_string)) {
                    Ok(Ok(key)) => Some(key),
                    _ => None,
                }
            } else {
                Some(text.to_string())
            };
            match choice {
                Some(key) => {
                    if let Err(err) = interaction.choose_menu_option(MenuChoice::Key(key)).await {
                        error!(error = %err, "menu callback failed");
                    }
                }
                None => {
                    debug!(reply = %text, menu = menu.name(), "unusable menu response");
                    self.queue_reply(interaction, MENU_APOLOGY, false);
                    interaction.end().await?;
                }
            }
            return Ok(());
        }

        if interaction.record_answer(text) {
            if interaction.take_ready_notification() {
                self.emit(AdapterEvent::CommandReceived(Arc::clone(interaction)));
            } else {
                self.send_follow_up(interaction);
            }
            // clear answers to follow-up questions out of the chat
            self.channel_for(&update.destination).delete(update.message_id.clone());
        }
        Ok(())
    }

    /// Prompts for the next missing required field. The interaction stays
    /// marked processing until the prompt is actually sent.
    fn send_follow_up(&self, interaction: &Arc<Interaction>) {
        if let Some(field) = interaction.begin_follow_up() {
            let prompt = format!("What is {}?", field.description);
            self.queue_reply(interaction, &prompt, true);
        }
    }

    /// Queues a reply in the interaction's destination: edits our previous
    /// reply in place when there is one, otherwise sends a new message
    /// referencing the user's. A pending menu message is withdrawn first.
    fn queue_reply(&self, interaction: &Arc<Interaction>, text: &str, clear_processing: bool) {
        let channel = self.channel_for(interaction.source().destination());

        if interaction.menu().is_some() {
            // the menu's message goes away so its choice buttons do too
            interaction.clear_menu();
            if let Some(previous) = interaction.take_bot_message() {
                channel.delete(previous.id);
            }
        }

        let text = truncate(text, self.client.max_text_len());
        let tracked = Arc::clone(interaction);
        let callback: crossbot_dispatch::SentCallback = Box::new(move |sent| {
            tracked.set_bot_message(sent.message);
            if clear_processing {
                tracked.set_processing(false);
            }
        });

        match interaction.bot_message() {
            Some(existing) => channel.edit(existing.id, text, Some(callback)),
            None => channel.send(
                text,
                Some(interaction.source().message_id().to_string()),
                None,
                false,
                Some(callback),
            ),
        }
    }

    /// The destination's dispatch channel, created lazily on first sight.
    fn channel_for(&self, destination: &DestinationId) -> Channel {
        let mut channels = self.channels.lock().unwrap();
        channels
            .entry(destination.clone())
            .or_insert_with(|| Channel::new(Arc::clone(&self.client), destination.clone()))
            .clone()
    }

    /// Empty allow-list admits everyone; otherwise the handle must be listed.
    fn is_admin(&self, handle: Option<&str>) -> bool {
        if self.config.admin_allowlist.is_empty() {
            return true;
        }
        handle.is_some_and(|h| self.config.admin_allowlist.iter().any(|a| a == h))
    }

    /// Retires the old destination's channel and starts a fresh one under the
    /// new id. Continuity cannot be guaranteed; operators get an alert and
    /// must update configuration. The status message state is dropped since
    /// the old message is no longer reachable.
    async fn handle_migration(&self, old: &DestinationId, new: &DestinationId) -> Result<()> {
        {
            let mut channels = self.channels.lock().unwrap();
            if let Some(channel) = channels.get(old) {
                channel.stop();
            }
            channels.insert(new.clone(), Channel::new(Arc::clone(&self.client), new.clone()));
        }

        let repointed = {
            let mut status_destination = self.status_destination.lock().unwrap();
            if status_destination.as_ref() == Some(old) {
                *status_destination = Some(new.clone());
                true
            } else {
                false
            }
        };
        if repointed {
            *self.status.lock().unwrap() = None;
        }

        self.log(&format!(
            "ALERT: destination {old} has migrated to {new}; update the settings file, \
             continuity is not guaranteed"
        ))
        .await
    }

    fn emit(&self, event: AdapterEvent) {
        if self.events.send(event).is_err() {
            warn!(platform = self.client.platform(), "orchestrator gone, event dropped");
        }
    }

    fn current_status_destination(&self) -> Option<DestinationId> {
        self.status_destination.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for ChatAdapter {
    fn platform(&self) -> &str {
        self.client.platform()
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn max_text_len(&self) -> usize {
        self.client.max_text_len()
    }

    async fn load_commands(&self) -> Result<()> {
        let admin_destinations: Vec<DestinationId> = [
            self.current_status_destination(),
            self.config.log_destination.clone(),
        ]
        .into_iter()
        .flatten()
        .collect();
        self.client
            .set_commands(&self.registry.commands(), &admin_destinations)
            .await
    }

    async fn create_or_update_status(&self, text: &str) -> Result<()> {
        if !self.is_ready() {
            return Ok(());
        }
        let Some(destination) = self.current_status_destination() else {
            return Ok(());
        };
        let channel = self.channel_for(&destination);
        let text = truncate(text, self.client.max_text_len());

        let mut status = self.status.lock().unwrap();
        match status.as_mut() {
            // editing a message to its current text would be rejected
            Some(current) if current.text == text => {}
            Some(current) => {
                current.text = text.clone();
                channel.edit(current.id.clone(), text, None);
            }
            None => {
                drop(status);
                let slot = Arc::clone(&self.status);
                let sent_text = text.clone();
                channel.send(
                    text,
                    None,
                    None,
                    false,
                    Some(Box::new(move |sent| {
                        let mut status = slot.lock().unwrap();
                        // a racing update may already have claimed the slot
                        if status.is_none() {
                            *status = Some(StatusMessage {
                                id: sent.message.id,
                                text: sent_text,
                            });
                        }
                    })),
                );
            }
        }
        Ok(())
    }

    async fn send_one_time_status(&self, text: &str, notify: bool) -> Result<()> {
        if !self.is_ready() {
            return Ok(());
        }
        let Some(destination) = self.current_status_destination() else {
            return Ok(());
        };
        let channel = self.channel_for(&destination);
        let text = truncate(text, self.client.max_text_len());

        if notify {
            // pinning (and promptly unpinning) forces a notification on
            // platforms that have no direct way to request one
            let pin_channel = channel.clone();
            channel.send(
                text,
                None,
                None,
                false,
                Some(Box::new(move |sent| {
                    pin_channel.pin(sent.message.id.clone(), true);
                    pin_channel.unpin(sent.message.id);
                })),
            );
        } else {
            channel.send(text, None, None, false, None);
        }
        Ok(())
    }

    async fn replace_status(&self, text: &str) -> Result<()> {
        let Some(destination) = self.current_status_destination() else {
            return Ok(());
        };
        let current = self.status.lock().unwrap().clone();
        let Some(current) = current else {
            return Ok(());
        };
        let channel = self.channel_for(&destination);
        let old_id = current.id.clone();

        // repost the live status as the newest message, then rewrite (or
        // remove) the old one
        let slot = Arc::clone(&self.status);
        let reposted = current.text.clone();
        channel.send(
            current.text,
            None,
            None,
            true,
            Some(Box::new(move |sent| {
                *slot.lock().unwrap() = Some(StatusMessage {
                    id: sent.message.id,
                    text: reposted,
                });
            })),
        );

        if text.is_empty() {
            channel.delete(old_id);
        } else {
            channel.edit(old_id, truncate(text, self.client.max_text_len()), None);
        }
        Ok(())
    }

    async fn log(&self, message: &str) -> Result<()> {
        info!(platform = self.client.platform(), "{message}");
        if self.is_ready() {
            if let Some(destination) = self.config.log_destination.clone() {
                self.channel_for(&destination)
                    .send(message.to_string(), None, None, false, None);
            }
        }
        Ok(())
    }

    async fn reply(&self, interaction: &Arc<Interaction>, text: &str) -> Result<()> {
        if !self.is_ready() {
            return Ok(());
        }
        self.queue_reply(interaction, text, false);
        Ok(())
    }

    async fn reply_with_options(
        &self,
        interaction: &Arc<Interaction>,
        menu: ReplyMenu,
        text: Option<&str>,
    ) -> Result<()> {
        if !self.is_ready() {
            return Ok(());
        }
        let channel = self.channel_for(interaction.source().destination());

        let mut body = text.unwrap_or_default().to_string();
        body.push('\n');
        body.push_str(&menu.render());
        let body = truncate(body.trim(), self.client.max_text_len());
        let labels = menu.button_labels();

        let previous = interaction.take_bot_message();
        interaction.set_menu(menu);

        let tracked = Arc::clone(interaction);
        channel.send(
            body,
            Some(interaction.source().message_id().to_string()),
            Some(labels),
            false,
            Some(Box::new(move |sent| {
                tracked.set_bot_message(sent.message);
                tracked.set_processing(false);
            })),
        );

        // a keyboard cannot be edited into an existing message, so the old
        // reply goes away once the menu is on its way
        if let Some(previous) = previous {
            channel.delete(previous.id);
        }
        Ok(())
    }

    async fn send_to_account(&self, account: &PlatformAccount, text: &str) -> Result<()> {
        let destination = self.client.direct_destination(account);
        self.channel_for(&destination)
            .send(text.to_string(), None, None, false, None);
        Ok(())
    }

    async fn remove_interaction(&self, interaction: &Arc<Interaction>) -> Result<()> {
        let key = ActiveKey::for_interaction(interaction);
        {
            let mut active = self.active.lock().unwrap();
            // the slot may already hold a newer interaction for the same key
            if active.get(&key).is_some_and(|current| Arc::ptr_eq(current, interaction)) {
                active.remove(&key);
            }
        }

        // delete lingering menu messages or their buttons keep popping up
        if interaction.menu().is_some() {
            interaction.clear_menu();
            if let Some(message) = interaction.take_bot_message() {
                self.channel_for(&message.destination).delete(message.id);
            }
        }
        Ok(())
    }
}
