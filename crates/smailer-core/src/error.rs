//! Error types for the core library.

use thiserror::Error;

use crate::event::EventState;
use crate::ports::TransportError;

/// Errors that can occur in core operations.
///
/// Delivery failures are not errors at this level; they are reported as
/// [`crate::DispatchError`] values inside outcomes.
#[derive(Debug, Error)]
pub enum Error {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential storage error.
    #[error("Credential error: {0}")]
    Credential(#[from] crate::credentials::CredentialError),

    /// Mail transport error outside of event delivery (inbox polling).
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// A state change was requested from a terminal state.
    #[error("Invalid event state transition: {from} -> {to}")]
    InvalidTransition {
        /// State the event is in.
        from: EventState,
        /// State that was requested.
        to: EventState,
    },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
