//! # crossbot-core
//!
//! Canonical types and traits for the cross-platform bot middleware:
//! [`Command`] and its registry, [`Interaction`] state, [`ReplyMenu`],
//! [`UnifiedUser`], the [`PlatformClient`] capability boundary, the
//! [`Messenger`] adapter contract, and tracing initialization.
//! Transport-agnostic; used by every other crate in the workspace.

pub mod client;
pub mod command;
pub mod error;
pub mod interaction;
pub mod logger;
pub mod menu;
pub mod messenger;
pub mod registry;
pub mod types;
pub mod user;

pub use client::PlatformClient;
pub use command::{Command, CommandField, MAX_DESCRIPTION_LEN, MAX_NAME_LEN};
pub use error::{CrossbotError, Result};
pub use interaction::{Interaction, InteractionKind};
pub use logger::init_tracing;
pub use menu::{MenuCallback, MenuChoice, ReplyMenu};
pub use messenger::{AdapterEvent, Messenger};
pub use registry::CommandRegistry;
pub use types::{
    truncate, AccountId, ClientIdentity, CommandSurface, DestinationId, InboundKind,
    InboundUpdate, InteractionSource, MessageRef, PlatformAccount, RateLimit, SendOptions,
    SentMessage,
};
pub use user::UnifiedUser;
