//! Error category classification.
//!
//! A coarse classification used to pick a retry policy and the wording a
//! caller shows next to the error.

use std::fmt;

/// High-level categorization of errors for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Connection, timeout and interrupted-stream errors.
    /// Generally transient and retryable.
    Network,

    /// HTTP 5xx or unparseable responses.
    Server,

    /// The backend understood the request and reported a failure
    /// (in-band `error` event, envelope `code != 200`).
    Backend,

    /// HTTP 4xx: the request itself was wrong.
    Client,

    /// Invalid input given to this program.
    User,

    /// Missing or invalid configuration.
    Configuration,
}

impl ErrorCategory {
    /// Returns true if errors in this category are generally transient
    /// and the operation can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Server)
    }

    /// Returns a short label for the category suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Server => "server",
            ErrorCategory::Backend => "backend",
            ErrorCategory::Client => "client",
            ErrorCategory::User => "user",
            ErrorCategory::Configuration => "configuration",
        }
    }

    /// Returns suggested recovery actions for this category.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Check that the server is reachable and try again",
            ErrorCategory::Server => "The server may be experiencing issues. Please try again later",
            ErrorCategory::Backend => "Check the knowledge base and its documents",
            ErrorCategory::Client => "This may be a bug. Please report this issue if it persists",
            ErrorCategory::User => "Please check your input and try again",
            ErrorCategory::Configuration => "Check your configuration settings",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
