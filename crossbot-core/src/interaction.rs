//! One logical exchange between a user and the bot, spanning one or more
//! physical messages.
//!
//! An [`Interaction`] is created from an inbound event, collects required
//! command fields over follow-up messages, may carry a [`ReplyMenu`], and is
//! removed from its adapter when ended. Kind is a sealed enum, matched
//! exhaustively; command and text interactions share one state shape.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::command::{Command, CommandField};
use crate::error::{CrossbotError, Result};
use crate::menu::{MenuChoice, ReplyMenu};
use crate::messenger::Messenger;
use crate::types::{InteractionSource, MessageRef};
use crate::user::UnifiedUser;

/// What kind of exchange this is.
#[derive(Debug, Clone)]
pub enum InteractionKind {
    /// A recognized command invocation, with its registered definition.
    Command(Command),
    /// Anything else the bot was addressed with.
    Text,
}

#[derive(Default)]
struct State {
    fields: HashMap<String, String>,
    /// Name of the required field the last follow-up prompt asked for.
    waiting_field: Option<String>,
    /// True while a reply of ours is still in flight; inbound answers are
    /// ignored during this to avoid racing the queue.
    processing: bool,
    /// The one command-received notification has been produced.
    notified: bool,
    menu: Option<ReplyMenu>,
    /// Our most recent reply message, edited in place by later replies.
    bot_message: Option<MessageRef>,
    user: Option<Arc<UnifiedUser>>,
    ended: bool,
}

pub struct Interaction {
    id: Uuid,
    kind: InteractionKind,
    source: InteractionSource,
    messenger: Arc<dyn Messenger>,
    created_at: DateTime<Utc>,
    state: Mutex<State>,
    /// Handle to the owning Arc, so operations can hand the interaction back
    /// to its messenger.
    self_ref: Weak<Interaction>,
}

impl Interaction {
    /// Creates a command interaction in the pending state. `initial_fields`
    /// carries whatever field values were syntactically present at invocation.
    /// The adapter's prepare step sends the first follow-up prompt if the
    /// interaction is not ready.
    pub fn new_command(
        source: InteractionSource,
        messenger: Arc<dyn Messenger>,
        command: Command,
        initial_fields: HashMap<String, String>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            id: Uuid::new_v4(),
            kind: InteractionKind::Command(command),
            source,
            messenger,
            created_at: Utc::now(),
            state: Mutex::new(State {
                fields: initial_fields,
                processing: true,
                ..State::default()
            }),
            self_ref: self_ref.clone(),
        })
    }

    /// Creates a text interaction.
    pub fn new_text(source: InteractionSource, messenger: Arc<dyn Messenger>) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            id: Uuid::new_v4(),
            kind: InteractionKind::Text,
            source,
            messenger,
            created_at: Utc::now(),
            state: Mutex::new(State {
                processing: true,
                ..State::default()
            }),
            self_ref: self_ref.clone(),
        })
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> &InteractionKind {
        &self.kind
    }

    /// The command definition, for command interactions.
    pub fn command(&self) -> Option<&Command> {
        match &self.kind {
            InteractionKind::Command(command) => Some(command),
            InteractionKind::Text => None,
        }
    }

    pub fn source(&self) -> &InteractionSource {
        &self.source
    }

    /// Raw text of the originating message.
    pub fn text(&self) -> &str {
        &self.source.text
    }

    pub fn messenger(&self) -> &Arc<dyn Messenger> {
        &self.messenger
    }

    /// Collected field values so far.
    pub fn fields(&self) -> HashMap<String, String> {
        self.state.lock().unwrap().fields.clone()
    }

    /// All required fields have values. Text interactions are always ready.
    pub fn is_ready(&self) -> bool {
        match &self.kind {
            InteractionKind::Text => true,
            InteractionKind::Command(command) => {
                let state = self.state.lock().unwrap();
                command
                    .required_fields()
                    .all(|f| state.fields.contains_key(&f.name))
            }
        }
    }

    /// Returns true exactly once, when the interaction first turns ready.
    /// Gates the single command-received notification.
    pub fn take_ready_notification(&self) -> bool {
        if !self.is_ready() {
            return false;
        }
        let mut state = self.state.lock().unwrap();
        if state.notified {
            return false;
        }
        state.notified = true;
        true
    }

    /// Picks the next missing required field, records it as the one awaited,
    /// and returns it so the adapter can prompt for it. None when ready.
    pub fn begin_follow_up(&self) -> Option<CommandField> {
        let command = self.command()?.clone();
        let mut state = self.state.lock().unwrap();
        let next = command
            .required_fields()
            .find(|f| !state.fields.contains_key(&f.name))
            .cloned()?;
        state.waiting_field = Some(next.name.clone());
        Some(next)
    }

    /// Records `text` as the answer to the awaited field. Returns false when
    /// nothing is awaited or the answer is empty.
    pub fn record_answer(&self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        let mut state = self.state.lock().unwrap();
        let Some(field) = state.waiting_field.take() else {
            return false;
        };
        state.fields.insert(field, text.to_string());
        state.processing = true;
        true
    }

    pub fn is_processing(&self) -> bool {
        self.state.lock().unwrap().processing
    }

    pub fn set_processing(&self, processing: bool) {
        self.state.lock().unwrap().processing = processing;
    }

    pub fn menu(&self) -> Option<ReplyMenu> {
        self.state.lock().unwrap().menu.clone()
    }

    pub fn set_menu(&self, menu: ReplyMenu) {
        self.state.lock().unwrap().menu = Some(menu);
    }

    pub fn clear_menu(&self) {
        self.state.lock().unwrap().menu = None;
    }

    pub fn bot_message(&self) -> Option<MessageRef> {
        self.state.lock().unwrap().bot_message.clone()
    }

    pub fn set_bot_message(&self, message: MessageRef) {
        self.state.lock().unwrap().bot_message = Some(message);
    }

    pub fn take_bot_message(&self) -> Option<MessageRef> {
        self.state.lock().unwrap().bot_message.take()
    }

    /// The unified user this interaction was attributed to, once the
    /// orchestrator has reconciled identity.
    pub fn user(&self) -> Option<Arc<UnifiedUser>> {
        self.state.lock().unwrap().user.clone()
    }

    pub fn set_user(&self, user: Arc<UnifiedUser>) {
        self.state.lock().unwrap().user = Some(user);
    }

    pub fn is_ended(&self) -> bool {
        self.state.lock().unwrap().ended
    }

    fn mark_ended(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.ended {
            return false;
        }
        state.ended = true;
        true
    }

    /// Sends a reply in this interaction via its platform adapter.
    pub async fn reply(&self, text: &str) -> Result<()> {
        let Some(this) = self.self_ref.upgrade() else {
            return Ok(());
        };
        self.messenger.reply(&this, text).await
    }

    /// Attaches a menu and sends it with optional leading text.
    pub async fn reply_with_options(&self, menu: ReplyMenu, text: Option<&str>) -> Result<()> {
        let Some(this) = self.self_ref.upgrade() else {
            return Ok(());
        };
        self.messenger.reply_with_options(&this, menu, text).await
    }

    /// Resolves the active menu by displayed position or raw key, dispatching
    /// the menu's callback with the resolved key.
    pub async fn choose_menu_option(&self, choice: MenuChoice) -> Result<()> {
        let Some(this) = self.self_ref.upgrade() else {
            return Ok(());
        };
        let menu = self
            .menu()
            .ok_or_else(|| CrossbotError::Menu("no active menu".to_string()))?;
        match choice {
            MenuChoice::Index(index) => menu.resolve_index(this, index).await,
            MenuChoice::Key(key) => menu.resolve_key(this, key).await,
        }
    }

    /// Ends the interaction: releases ephemeral affordances and removes it
    /// from the adapter's active set. Idempotent.
    pub async fn end(&self) -> Result<()> {
        if !self.mark_ended() {
            return Ok(());
        }
        let Some(this) = self.self_ref.upgrade() else {
            return Ok(());
        };
        self.messenger.remove_interaction(&this).await
    }
}

impl fmt::Debug for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interaction")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("source", &self.source)
            .finish()
    }
}
