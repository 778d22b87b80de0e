//! Error types for the crossbot core.
//!
//! [`CrossbotError`] is the top-level error shared by every crate in the workspace.

use thiserror::Error;

/// Top-level error for crossbot (validation, command lookup, platform transport, config, IO).
#[derive(Error, Debug)]
pub enum CrossbotError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Menu error: {0}")]
    Menu(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Result type for core operations; uses [`CrossbotError`].
pub type Result<T> = std::result::Result<T, CrossbotError>;
