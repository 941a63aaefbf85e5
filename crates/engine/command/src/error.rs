//! Error types for command dispatch

use crate::issue::CommandError;

/// Errors that can occur while dispatching a command
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The worker has not been started yet
    #[error("Worker not initialized")]
    NotInitialized,

    /// The worker was disposed or its backend went away before answering
    #[error("Worker is gone")]
    WorkerGone,

    /// The backend refused to accept the command
    #[error("Command rejected by backend: {0}")]
    Rejected(String),

    /// The engine aborted the command, usually because of a reset
    #[error("Command canceled: {0}")]
    Canceled(CommandError),

    /// The engine reported an error for the command
    #[error("Command failed: {0}")]
    Command(CommandError),

    /// Serializing a command failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The response did not match the expected shape
    #[error("Unexpected response to '{command}': {source}")]
    Deserialization {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    /// A backend value could not be interpreted as the requested type
    #[error("Expected {expected}, got '{raw}'")]
    InvalidValue { expected: &'static str, raw: String },

    /// `getAttributeSeparately` returned no entry for the anchor
    #[error("No value for anchor '{0}'")]
    AnchorNotFound(String),
}

/// Result type for command operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns true if the engine aborted the command
    pub fn is_canceled(&self) -> bool {
        matches!(self, Error::Canceled(_))
    }

    /// The engine-side error, if there is one
    pub fn command_error(&self) -> Option<&CommandError> {
        match self {
            Error::Canceled(e) | Error::Command(e) => Some(e),
            _ => None,
        }
    }
}

/// Splits engine errors into cancellation and genuine failure
impl From<CommandError> for Error {
    fn from(err: CommandError) -> Self {
        if err.is_canceled() {
            Error::Canceled(err)
        } else {
            Error::Command(err)
        }
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for Error {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        Error::WorkerGone
    }
}
