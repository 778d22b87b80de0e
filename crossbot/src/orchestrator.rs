//! Initializer and coordinator of the bot system. Registers commands and
//! listeners from the calling program and passes requests back to it,
//! abstracting away the individual chat platforms.

use std::future::Future;
use std::sync::{Arc, Mutex};

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use tokio::sync::mpsc;
use tracing::{error, warn};

use crossbot_core::{
    AdapterEvent, Command, CommandRegistry, CrossbotError, Interaction, Messenger,
    PlatformAccount, Result, UnifiedUser,
};

/// Listener for command/text interactions. Errors are logged at the dispatch
/// boundary and never halt the event loop.
pub type InteractionListener =
    Arc<dyn Fn(Arc<Interaction>) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;
/// Listener for platform first-ready.
pub type ReadyListener = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;
/// Listener for unified-user info changes.
pub type UserUpdateListener =
    Arc<dyn Fn(Arc<UnifiedUser>) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// The orchestrator: owns the command registry, the adapters, the known
/// unified users, and the registered listener lists (fan-out order is the
/// registration order).
pub struct Crossbot {
    registry: Arc<CommandRegistry>,
    messengers: Mutex<Vec<Arc<dyn Messenger>>>,
    known_users: Mutex<Vec<Arc<UnifiedUser>>>,
    on_command: Mutex<Vec<InteractionListener>>,
    on_text: Mutex<Vec<InteractionListener>>,
    on_ready: Mutex<Vec<ReadyListener>>,
    on_user_update: Mutex<Vec<UserUpdateListener>>,
    events_tx: mpsc::UnboundedSender<AdapterEvent>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<AdapterEvent>>>,
}

impl Crossbot {
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            registry: Arc::new(CommandRegistry::new()),
            messengers: Mutex::new(Vec::new()),
            known_users: Mutex::new(Vec::new()),
            on_command: Mutex::new(Vec::new()),
            on_text: Mutex::new(Vec::new()),
            on_ready: Mutex::new(Vec::new()),
            on_user_update: Mutex::new(Vec::new()),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
        }
    }

    /// The shared command registry, for handing to adapters.
    pub fn registry(&self) -> Arc<CommandRegistry> {
        Arc::clone(&self.registry)
    }

    /// The sender adapters deliver their events on.
    pub fn event_sender(&self) -> mpsc::UnboundedSender<AdapterEvent> {
        self.events_tx.clone()
    }

    /// Registers a platform adapter with the orchestrator.
    pub fn add_messenger(&self, messenger: Arc<dyn Messenger>) {
        self.messengers.lock().unwrap().push(messenger);
    }

    /// Adds a command to the registry (duplicates are logged and dropped).
    pub fn add_command(&self, command: Command) {
        self.registry.register(command);
    }

    /// Registers a listener for completed command interactions.
    pub fn register_command_handler<F, Fut>(&self, handler: F)
    where
        F: Fn(Arc<Interaction>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.on_command
            .lock()
            .unwrap()
            .push(Arc::new(move |i| handler(i).boxed()));
    }

    /// Registers a listener for text interactions.
    pub fn register_text_handler<F, Fut>(&self, handler: F)
    where
        F: Fn(Arc<Interaction>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.on_text
            .lock()
            .unwrap()
            .push(Arc::new(move |i| handler(i).boxed()));
    }

    /// Registers a listener for platform first-ready.
    pub fn register_ready_handler<F, Fut>(&self, handler: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.on_ready
            .lock()
            .unwrap()
            .push(Arc::new(move || handler().boxed()));
    }

    /// Registers a listener for user info changes.
    pub fn register_user_update_handler<F, Fut>(&self, handler: F)
    where
        F: Fn(Arc<UnifiedUser>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.on_user_update
            .lock()
            .unwrap()
            .push(Arc::new(move |u| handler(u).boxed()));
    }

    /// Consumes adapter events until every adapter's sender is gone. Call
    /// once; a second call fails.
    pub async fn run(&self) -> Result<()> {
        let mut events = self
            .events_rx
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| CrossbotError::Unknown("event loop already running".to_string()))?;
        while let Some(event) = events.recv().await {
            self.dispatch(event).await;
        }
        Ok(())
    }

    async fn dispatch(&self, event: AdapterEvent) {
        match event {
            AdapterEvent::FirstReady { platform } => {
                // the platform can take its native command surface now
                if let Some(messenger) = self.messenger_for(&platform) {
                    if let Err(err) = messenger.load_commands().await {
                        error!(platform = %platform, error = %err, "failed to push commands");
                    }
                }
                for listener in self.ready_listeners() {
                    if let Err(err) = listener().await {
                        error!(error = %err, "ready handler failed");
                    }
                }
            }
            AdapterEvent::CommandReceived(interaction) => {
                let user = self.create_or_find_user(&interaction).await;
                interaction.set_user(user);
                for listener in self.command_listeners() {
                    if let Err(err) = listener(Arc::clone(&interaction)).await {
                        error!(error = %err, "command handler failed");
                    }
                }
            }
            AdapterEvent::TextReceived(interaction) => {
                let user = self.create_or_find_user(&interaction).await;
                interaction.set_user(user);
                for listener in self.text_listeners() {
                    if let Err(err) = listener(Arc::clone(&interaction)).await {
                        error!(error = %err, "text handler failed");
                    }
                }
            }
        }
    }

    /// Finds the unified user owning the interaction's originating account,
    /// creating one on first sight. A known account whose observed name or
    /// handle changed is refreshed in place, raising one user-updated
    /// notification.
    async fn create_or_find_user(&self, interaction: &Arc<Interaction>) -> Arc<UnifiedUser> {
        let account = &interaction.source().account;
        let known = self
            .known_users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.owns(&account.id))
            .cloned();
        match known {
            Some(user) => {
                if user.refresh_account(account) {
                    for listener in self.user_update_listeners() {
                        if let Err(err) = listener(Arc::clone(&user)).await {
                            error!(error = %err, "user update handler failed");
                        }
                    }
                }
                user
            }
            None => {
                let user = Arc::new(UnifiedUser::new(account.clone()));
                self.known_users.lock().unwrap().push(Arc::clone(&user));
                user
            }
        }
    }

    /// The unified user owning the given platform account, if known.
    pub fn get_user(&self, account: &PlatformAccount) -> Option<Arc<UnifiedUser>> {
        self.known_users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.owns(&account.id))
            .cloned()
    }

    /// Sends a log message to every platform's log destination.
    pub async fn log_all(&self, message: &str) -> Result<()> {
        let results = join_all(self.all_messengers().iter().map(|m| m.log(message))).await;
        report_fan_out(results, "log");
        Ok(())
    }

    /// Updates the status message on every platform.
    pub async fn send_status_update(&self, message: &str) -> Result<()> {
        let results = join_all(
            self.all_messengers()
                .iter()
                .map(|m| m.create_or_update_status(message)),
        )
        .await;
        report_fan_out(results, "status update");
        Ok(())
    }

    /// Sends a one-off status message on every platform, optionally notifying.
    pub async fn send_one_time_status_update(&self, message: &str, notify: bool) -> Result<()> {
        let results = join_all(
            self.all_messengers()
                .iter()
                .map(|m| m.send_one_time_status(message, notify)),
        )
        .await;
        report_fan_out(results, "one-time status");
        Ok(())
    }

    /// Replaces the rolling status message with a one-time text, then starts
    /// a fresh status message, on every platform.
    pub async fn replace_status_message(&self, message: &str) -> Result<()> {
        let results = join_all(
            self.all_messengers()
                .iter()
                .map(|m| m.replace_status(message)),
        )
        .await;
        report_fan_out(results, "status replace");
        Ok(())
    }

    /// Sends a message to a user's primary account. A message aimed at
    /// someone the system has never seen degrades to a log entry.
    pub async fn send_to_user(&self, user: Option<&Arc<UnifiedUser>>, message: &str) -> Result<()> {
        let Some(user) = user else {
            return self.log_all(&format!("Message to unknown user: {message}")).await;
        };
        let account = user.primary_account();
        match self.messenger_for(&account.platform) {
            Some(messenger) => messenger.send_to_account(&account, message).await,
            None => {
                warn!(platform = %account.platform, "no adapter for platform, message dropped");
                Ok(())
            }
        }
    }

    fn messenger_for(&self, platform: &str) -> Option<Arc<dyn Messenger>> {
        self.messengers
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.platform() == platform)
            .cloned()
    }

    fn all_messengers(&self) -> Vec<Arc<dyn Messenger>> {
        self.messengers.lock().unwrap().clone()
    }

    fn command_listeners(&self) -> Vec<InteractionListener> {
        self.on_command.lock().unwrap().clone()
    }

    fn text_listeners(&self) -> Vec<InteractionListener> {
        self.on_text.lock().unwrap().clone()
    }

    fn ready_listeners(&self) -> Vec<ReadyListener> {
        self.on_ready.lock().unwrap().clone()
    }

    fn user_update_listeners(&self) -> Vec<UserUpdateListener> {
        self.on_user_update.lock().unwrap().clone()
    }
}

impl Default for Crossbot {
    fn default() -> Self {
        Self::new()
    }
}

fn report_fan_out(results: Vec<Result<()>>, what: &str) {
    for result in results {
        if let Err(err) = result {
            warn!(error = %err, "{what} fan-out failed on one platform");
        }
    }
}
