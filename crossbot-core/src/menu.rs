//! A menu of options sent back to a user for them to select from.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::{CrossbotError, Result};
use crate::interaction::Interaction;

/// What to do when a menu choice comes back: called with the owning
/// interaction and the resolved option key.
pub type MenuCallback =
    Arc<dyn Fn(Arc<Interaction>, String) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// How a user identifies a chosen option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuChoice {
    /// 1-based position in display order.
    Index(usize),
    /// The raw option key.
    Key(String),
}

/// A finite labeled choice set. Options keep insertion order; display is
/// either numbered (1..n mapped back to keys) or keyed (raw keys shown).
#[derive(Clone)]
pub struct ReplyMenu {
    name: String,
    options: Vec<(String, String)>,
    numbered: bool,
    on_choice: MenuCallback,
}

impl ReplyMenu {
    /// Builds a menu from a name, ordered (key, label) options, and a
    /// resolution callback. Numbered display is the default.
    pub fn new(name: &str, options: Vec<(String, String)>, on_choice: MenuCallback) -> Self {
        Self {
            name: name.to_string(),
            options,
            numbered: true,
            on_choice,
        }
    }

    /// Switches between numbered positions and raw keys as the displayed choices.
    pub fn with_numbered_choices(mut self, numbered: bool) -> Self {
        self.numbered = numbered;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_numbered(&self) -> bool {
        self.numbered
    }

    pub fn options(&self) -> &[(String, String)] {
        &self.options
    }

    /// The labels to show on one-tap buttons: "1".."n" when numbered,
    /// otherwise the raw keys.
    pub fn button_labels(&self) -> Vec<String> {
        self.options
            .iter()
            .enumerate()
            .map(|(i, (key, _))| {
                if self.numbered {
                    (i + 1).to_string()
                } else {
                    key.clone()
                }
            })
            .collect()
    }

    /// Text rendering: one "index: label" line per option in map order, trimmed.
    pub fn render(&self) -> String {
        let mut text = String::new();
        for (i, (key, label)) in self.options.iter().enumerate() {
            if self.numbered {
                text.push_str(&format!("{}: {}\n", i + 1, label));
            } else {
                text.push_str(&format!("{key}: {label}\n"));
            }
        }
        text.trim().to_string()
    }

    /// Maps a 1-based displayed position back to the option key.
    pub fn key_at(&self, index: usize) -> Result<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.options.get(i))
            .map(|(key, _)| key.as_str())
            .ok_or_else(|| {
                CrossbotError::Menu(format!("menu {} has no option {index}", self.name))
            })
    }

    /// Dispatches the resolution callback with a raw key.
    pub async fn resolve_key(&self, interaction: Arc<Interaction>, key: String) -> Result<()> {
        (self.on_choice)(interaction, key).await
    }

    /// Translates a displayed position to its key, then dispatches identically
    /// to [`resolve_key`](Self::resolve_key).
    pub async fn resolve_index(&self, interaction: Arc<Interaction>, index: usize) -> Result<()> {
        let key = self.key_at(index)?.to_string();
        self.resolve_key(interaction, key).await
    }
}

impl fmt::Debug for ReplyMenu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplyMenu")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("numbered", &self.numbered)
            .finish()
    }
}
