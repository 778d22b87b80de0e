//! Holds all the commands registered for the bot to push to its platforms.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::{debug, warn};

use crate::command::Command;
use crate::error::{CrossbotError, Result};

/// Canonical command store. Names are unique case-insensitively; duplicate
/// registration keeps the first definition.
///
/// Populated once at startup before any adapter accepts events; reads during
/// serving are cheap, concurrent writes are not a supported pattern.
#[derive(Default)]
pub struct CommandRegistry {
    commands: RwLock<HashMap<String, Command>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command under its lowercased name. A duplicate is logged
    /// and discarded; the registry is unchanged.
    pub fn register(&self, mut command: Command) {
        command.normalize_name();
        let mut commands = self.commands.write().unwrap();
        if commands.contains_key(command.name()) {
            warn!(command = command.name(), "attempted to add command more than once, ignored");
            return;
        }
        debug!(command = command.name(), "command registered");
        commands.insert(command.name().to_string(), command);
    }

    /// Looks up a command by name (case-insensitive).
    pub fn get(&self, name: &str) -> Result<Command> {
        let name = name.to_ascii_lowercase();
        self.commands
            .read()
            .unwrap()
            .get(&name)
            .cloned()
            .ok_or(CrossbotError::UnknownCommand(name))
    }

    /// Pure existence check (case-insensitive).
    pub fn has(&self, name: &str) -> bool {
        self.commands
            .read()
            .unwrap()
            .contains_key(&name.to_ascii_lowercase())
    }

    /// All registered commands, for pushing to a platform's native surface.
    pub fn commands(&self) -> Vec<Command> {
        self.commands.read().unwrap().values().cloned().collect()
    }
}
