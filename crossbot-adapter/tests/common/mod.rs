//! In-memory [`PlatformClient`] and update builders for adapter tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use crossbot_core::{
    AccountId, ClientIdentity, Command, CommandSurface, DestinationId, InboundKind, InboundUpdate,
    MessageRef, PlatformAccount, PlatformClient, RateLimit, Result, SendOptions, SentMessage,
};

#[derive(Debug, Clone)]
pub struct RecordedSend {
    pub destination: String,
    pub text: String,
    pub reply_to: Option<String>,
    pub buttons: Option<Vec<String>>,
    pub disable_notification: bool,
}

/// Records every platform call the adapter makes.
pub struct MockClient {
    pub surface: CommandSurface,
    pub sends: Mutex<Vec<RecordedSend>>,
    pub edits: Mutex<Vec<(String, String)>>,
    pub deletes: Mutex<Vec<String>>,
    pub pins: Mutex<Vec<(String, bool)>>,
    pub unpins: Mutex<Vec<String>>,
    pub pushed_commands: Mutex<Vec<(Vec<String>, Vec<String>)>>,
    pub typing_count: AtomicUsize,
    next_id: AtomicUsize,
}

impl MockClient {
    pub fn new(surface: CommandSurface) -> Self {
        Self {
            surface,
            sends: Mutex::new(Vec::new()),
            edits: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
            pins: Mutex::new(Vec::new()),
            unpins: Mutex::new(Vec::new()),
            pushed_commands: Mutex::new(Vec::new()),
            typing_count: AtomicUsize::new(0),
            next_id: AtomicUsize::new(0),
        }
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sends.lock().unwrap().iter().map(|s| s.text.clone()).collect()
    }

    pub fn sends_to(&self, destination: &str) -> Vec<RecordedSend> {
        self.sends
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.destination == destination)
            .cloned()
            .collect()
    }

    fn next_message_id(&self) -> String {
        format!("m{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl PlatformClient for MockClient {
    fn platform(&self) -> &str {
        "mock"
    }

    fn max_text_len(&self) -> usize {
        4096
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            window: Duration::from_secs(1),
            max_calls: 100,
        }
    }

    fn command_surface(&self) -> CommandSurface {
        self.surface
    }

    async fn connect(&self) -> Result<ClientIdentity> {
        Ok(ClientIdentity {
            name: "Mock Bot".to_string(),
            handle: "mockbot".to_string(),
        })
    }

    async fn send_message(
        &self,
        destination: &DestinationId,
        text: &str,
        options: SendOptions,
    ) -> Result<SentMessage> {
        self.sends.lock().unwrap().push(RecordedSend {
            destination: destination.0.clone(),
            text: text.to_string(),
            reply_to: options.reply_to,
            buttons: options.buttons,
            disable_notification: options.disable_notification,
        });
        Ok(SentMessage {
            message: MessageRef {
                destination: destination.clone(),
                id: self.next_message_id(),
            },
        })
    }

    async fn edit_message(&self, message: &MessageRef, text: &str) -> Result<SentMessage> {
        self.edits
            .lock()
            .unwrap()
            .push((message.id.clone(), text.to_string()));
        Ok(SentMessage {
            message: message.clone(),
        })
    }

    async fn delete_message(&self, message: &MessageRef) -> Result<()> {
        self.deletes.lock().unwrap().push(message.id.clone());
        Ok(())
    }

    async fn show_typing(&self, _destination: &DestinationId) -> Result<()> {
        self.typing_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn pin_message(&self, message: &MessageRef, notify: bool) -> Result<()> {
        self.pins.lock().unwrap().push((message.id.clone(), notify));
        Ok(())
    }

    async fn unpin_message(&self, message: &MessageRef) -> Result<()> {
        self.unpins.lock().unwrap().push(message.id.clone());
        Ok(())
    }

    async fn set_commands(
        &self,
        commands: &[Command],
        admin_destinations: &[DestinationId],
    ) -> Result<()> {
        self.pushed_commands.lock().unwrap().push((
            commands.iter().map(|c| c.name().to_string()).collect(),
            admin_destinations.iter().map(|d| d.0.clone()).collect(),
        ));
        Ok(())
    }

    fn direct_destination(&self, account: &PlatformAccount) -> DestinationId {
        DestinationId(account.id.0.clone())
    }
}

pub fn account(id: &str, name: &str, handle: Option<&str>) -> PlatformAccount {
    PlatformAccount {
        platform: "mock".to_string(),
        id: AccountId(id.to_string()),
        name: name.to_string(),
        handle: handle.map(|h| h.to_string()),
    }
}

pub fn text_update(destination: &str, message_id: &str, from: PlatformAccount, text: &str) -> InboundUpdate {
    InboundUpdate {
        destination: DestinationId(destination.to_string()),
        message_id: message_id.to_string(),
        account: Some(from),
        kind: InboundKind::Text {
            text: text.to_string(),
        },
    }
}

#[allow(dead_code)]
pub fn command_update(
    destination: &str,
    message_id: &str,
    from: PlatformAccount,
    name: &str,
    args: HashMap<String, String>,
) -> InboundUpdate {
    InboundUpdate {
        destination: DestinationId(destination.to_string()),
        message_id: message_id.to_string(),
        account: Some(from),
        kind: InboundKind::Command {
            name: name.to_string(),
            args,
        },
    }
}

#[allow(dead_code)]
pub fn migration_update(old: &str, new: &str) -> InboundUpdate {
    InboundUpdate {
        destination: DestinationId(old.to_string()),
        message_id: String::new(),
        account: None,
        kind: InboundKind::Migration {
            new_destination: DestinationId(new.to_string()),
        },
    }
}

/// Polls until `condition` holds; panics after a generous virtual-time budget.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..2000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}
