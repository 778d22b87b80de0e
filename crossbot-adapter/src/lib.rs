//! # crossbot-adapter
//!
//! Platform-agnostic adapter engine. [`ChatAdapter`] drives any
//! [`crossbot_core::PlatformClient`]: it classifies inbound updates into
//! command or text interactions, collects required fields over follow-ups,
//! resolves menus, gates admin commands, and owns one dispatch channel per
//! destination it has seen. It implements the [`crossbot_core::Messenger`]
//! contract the orchestrator consumes.

mod adapter;
mod config;
mod factory;

pub use adapter::ChatAdapter;
pub use config::AdapterConfig;
