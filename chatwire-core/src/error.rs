//! Error types for a chat attempt

use crate::config::ConfigError;
use thiserror::Error;

/// Result type for chat operations
pub type ChatResult<T> = Result<T, ChatError>;

/// Errors that terminate a request/response cycle.
///
/// Decode anomalies inside an event stream have no variant: a frame
/// that cannot be parsed is delivered as literal text instead.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The server answered with a non-success status
    #[error("{message}")]
    RequestFailed {
        status: u16,
        message: String,
        details: Option<String>,
    },

    /// An event stream was negotiated but the body cannot be read incrementally
    #[error("Streaming is not supported by this transport")]
    StreamUnsupported,

    /// The attempt's token was invalidated before completion
    #[error("Request was cancelled")]
    Cancelled,

    /// Network or connection error, including mid-stream read failures
    #[error("Transport error: {0}")]
    Transport(String),

    /// A complete (non-streaming) body did not match the response shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The request payload could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Client construction from configuration failed
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ChatError {
    /// Whether this error is the silent cancellation outcome
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// HTTP status of a failed request, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ChatError::Transport(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            ChatError::Transport(format!("Connection failed: {}", err))
        } else if err.is_body() || err.is_decode() {
            ChatError::Transport(format!("Failed to read response body: {}", err))
        } else {
            ChatError::Transport(err.to_string())
        }
    }
}
