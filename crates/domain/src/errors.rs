//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for PunchSync
///
/// Variants carry the human-readable message shown to operators. Use
/// [`PunchSyncError::user_message`] when the message must be surfaced without
/// the category prefix.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum PunchSyncError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    /// The remote service did not answer within the configured deadline.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// No connection could be established with the remote service.
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PunchSyncError {
    /// Message without the category prefix.
    pub fn user_message(&self) -> &str {
        match self {
            Self::Database(msg)
            | Self::Config(msg)
            | Self::Auth(msg)
            | Self::Timeout(msg)
            | Self::Connection(msg)
            | Self::Network(msg)
            | Self::NotFound(msg)
            | Self::InvalidInput(msg)
            | Self::Internal(msg) => msg,
        }
    }
}

/// Result type alias for PunchSync operations
pub type Result<T> = std::result::Result<T, PunchSyncError>;
