//! Error types for the core library

use thiserror::Error;

/// Coarse classification of an [`Error`], used by callers to decide what to
/// tell the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Another mutation is already in flight for the record. Nothing happened.
    Busy,
    /// The remote call failed. Any optimistic change has been rolled back.
    Remote,
    /// The request was rejected locally before touching the cache.
    InvalidInput,
    /// The session was closed.
    Closed,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Task {task_id} already has a mutation in flight")]
    Busy { task_id: u64 },

    #[error("Remote service returned {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Remote call timed out after {millis} ms")]
    Timeout { millis: u64 },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Session is closed")]
    Closed,
}

impl Error {
    /// Create a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a Remote error from a non-2xx response
    pub fn remote(status: u16, body: impl Into<String>) -> Self {
        Self::Remote {
            status,
            body: body.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Busy { .. } => ErrorKind::Busy,
            Self::Remote { .. } | Self::Transport { .. } | Self::Timeout { .. } | Self::Decode(_) => {
                ErrorKind::Remote
            }
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Closed => ErrorKind::Closed,
        }
    }
}
