//! Streaming-related error types.
//!
//! A chat turn can end in failure two ways, and callers render them
//! differently: the backend can say so itself with an in-band `error`
//! event, or the transport underneath the stream can fail.

use std::fmt;

use super::{ErrorCategory, NetworkError};

/// Terminal failure of a streamed answer.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamError {
    /// Backend reported an error via an SSE `error` event.
    Application {
        message: String,
    },

    /// Network or HTTP failure (connect error, non-2xx status,
    /// connection reset mid-body, idle timeout).
    Transport(NetworkError),
}

impl StreamError {
    pub fn application(message: impl Into<String>) -> Self {
        StreamError::Application {
            message: message.into(),
        }
    }

    /// True when the failure came from the transport, not the backend.
    pub fn is_transport(&self) -> bool {
        matches!(self, StreamError::Transport(_))
    }

    /// Check if this error is likely transient and the request can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            StreamError::Application { .. } => false,
            StreamError::Transport(err) => err.is_retryable(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            StreamError::Application { .. } => ErrorCategory::Backend,
            StreamError::Transport(err) => err.category(),
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            // Application errors are shown verbatim
            StreamError::Application { message } => message.clone(),
            StreamError::Transport(err) => err.user_message(),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            StreamError::Application { .. } => "E_STREAM_BACKEND",
            StreamError::Transport(err) => err.error_code(),
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::Application { message } => write!(f, "Backend error: {}", message),
            StreamError::Transport(err) => write!(f, "Transport error: {}", err),
        }
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StreamError::Application { .. } => None,
            StreamError::Transport(err) => Some(err),
        }
    }
}

impl From<NetworkError> for StreamError {
    fn from(err: NetworkError) -> Self {
        StreamError::Transport(err)
    }
}
