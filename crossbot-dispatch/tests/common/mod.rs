//! In-memory [`PlatformClient`] used by channel tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use crossbot_core::{
    ClientIdentity, Command, CommandSurface, CrossbotError, DestinationId, MessageRef,
    PlatformAccount, PlatformClient, RateLimit, Result, SendOptions, SentMessage,
};

#[derive(Debug, Clone)]
pub struct RecordedSend {
    pub destination: String,
    pub text: String,
    pub reply_to: Option<String>,
    pub buttons: Option<Vec<String>>,
    pub disable_notification: bool,
}

/// Records every call; optional failure knobs for the fallback paths.
#[derive(Default)]
pub struct MockClient {
    pub sends: Mutex<Vec<RecordedSend>>,
    pub edits: Mutex<Vec<(String, String)>>,
    pub deletes: Mutex<Vec<String>>,
    pub pins: Mutex<Vec<(String, bool)>>,
    pub unpins: Mutex<Vec<String>>,
    pub typing_count: AtomicUsize,
    pub fail_send_with_reference: bool,
    pub fail_edit: bool,
    next_id: AtomicUsize,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// A client that rejects any send carrying a reply reference.
    pub fn failing_reference_sends() -> Self {
        Self {
            fail_send_with_reference: true,
            ..Self::default()
        }
    }

    /// A client whose edit targets are always gone.
    pub fn failing_edits() -> Self {
        Self {
            fail_edit: true,
            ..Self::default()
        }
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sends.lock().unwrap().iter().map(|s| s.text.clone()).collect()
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
        CommandSurface::FreeText
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
        if self.fail_send_with_reference && options.reply_to.is_some() {
            return Err(CrossbotError::Platform(
                "replied-to message not found".to_string(),
            ));
        }
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
        if self.fail_edit {
            return Err(CrossbotError::Platform("message to edit not found".to_string()));
        }
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
        _commands: &[Command],
        _admin_destinations: &[DestinationId],
    ) -> Result<()> {
        Ok(())
    }

    fn direct_destination(&self, account: &PlatformAccount) -> DestinationId {
        DestinationId(account.id.0.clone())
    }
}

