//! # crossbot
//!
//! Host-facing facade of the cross-platform bot middleware. [`Crossbot`]
//! aggregates platform adapters, reconciles cross-platform user identity,
//! and fans adapter events out to the host's registered listeners.
//!
//! The calling program registers commands and handlers, wires up one or more
//! platform adapters, and drives everything through one unified stream.

mod orchestrator;

pub use orchestrator::{Crossbot, InteractionListener, ReadyListener, UserUpdateListener};

pub use crossbot_adapter::{AdapterConfig, ChatAdapter};
pub use crossbot_core::{
    init_tracing, AdapterEvent, Command, CommandField, CommandRegistry, CrossbotError,
    Interaction, InteractionKind, MenuChoice, Messenger, PlatformAccount, PlatformClient,
    ReplyMenu, Result, UnifiedUser,
};
