//! Network-related error types.
//!
//! This module defines errors that occur while talking to the backend over
//! HTTP: connecting, waiting for data, and reading the response body.

use std::fmt;
use std::time::Duration;

use super::ErrorCategory;

/// Network-specific error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// Connection to the server failed.
    ConnectionFailed {
        url: String,
        message: String,
    },

    /// Request or body read timed out. A zero `duration` means the limit
    /// is not known.
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// HTTP status error (non-2xx response).
    HttpStatus {
        status: u16,
        message: String,
    },

    /// The response body broke off while it was being read.
    StreamInterrupted {
        message: String,
    },

    /// Invalid response format.
    InvalidResponse {
        message: String,
    },

    /// Generic network error.
    Other {
        message: String,
    },
}

impl NetworkError {
    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            NetworkError::ConnectionFailed { .. } => true,
            NetworkError::Timeout { .. } => true,
            NetworkError::HttpStatus { status, .. } => {
                *status >= 500 || *status == 429 || *status == 408
            }
            NetworkError::StreamInterrupted { .. } => true,
            NetworkError::InvalidResponse { .. } => false,
            NetworkError::Other { .. } => false,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            NetworkError::HttpStatus { status, .. } if *status >= 500 => ErrorCategory::Server,
            NetworkError::HttpStatus { .. } => ErrorCategory::Client,
            NetworkError::InvalidResponse { .. } => ErrorCategory::Server,
            _ => ErrorCategory::Network,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            NetworkError::ConnectionFailed { .. } => {
                "Unable to connect to the knowledge-base server. Is it running?".to_string()
            }
            NetworkError::Timeout { operation, duration } => {
                format!(
                    "The {} operation timed out{}. The server may be slow or unreachable.",
                    operation,
                    after(*duration)
                )
            }
            NetworkError::HttpStatus { status, .. } => match *status {
                400 => "The request was invalid. Please check the parameters.".to_string(),
                404 => "The requested resource was not found.".to_string(),
                429 => "Too many requests. Please wait a moment and try again.".to_string(),
                500..=599 => "The server is experiencing issues. Please try again later.".to_string(),
                _ => format!("The server returned an error (HTTP {}).", status),
            },
            NetworkError::StreamInterrupted { .. } => {
                "The connection dropped while the answer was streaming.".to_string()
            }
            NetworkError::InvalidResponse { .. } => {
                "Received an invalid response from the server.".to_string()
            }
            NetworkError::Other { message } => format!("Network error: {}", message),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed { .. } => "E_NET_CONN",
            NetworkError::Timeout { .. } => "E_NET_TIMEOUT",
            NetworkError::HttpStatus { .. } => "E_NET_HTTP",
            NetworkError::StreamInterrupted { .. } => "E_NET_STREAM",
            NetworkError::InvalidResponse { .. } => "E_NET_INVALID",
            NetworkError::Other { .. } => "E_NET_OTHER",
        }
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::ConnectionFailed { url, message } => {
                write!(f, "Connection failed to '{}': {}", url, message)
            }
            NetworkError::Timeout { operation, duration } => {
                write!(f, "{} timed out{}", operation, after(*duration))
            }
            NetworkError::HttpStatus { status, message } => {
                write!(f, "HTTP {} error: {}", status, message)
            }
            NetworkError::StreamInterrupted { message } => {
                write!(f, "Response stream interrupted: {}", message)
            }
            NetworkError::InvalidResponse { message } => {
                write!(f, "Invalid response: {}", message)
            }
            NetworkError::Other { message } => write!(f, "Network error: {}", message),
        }
    }
}

impl std::error::Error for NetworkError {}

/// `" after 1.5 seconds"`, `" after 250 ms"`, or nothing for an unknown limit
fn after(duration: Duration) -> String {
    if duration.is_zero() {
        String::new()
    } else if duration < Duration::from_secs(1) {
        format!(" after {} ms", duration.as_millis().max(1))
    } else if duration.subsec_millis() == 0 {
        format!(" after {} seconds", duration.as_secs())
    } else {
        format!(" after {:.1} seconds", duration.as_secs_f64())
    }
}

/// Classify a reqwest error into a NetworkError.
///
/// `reading_body` marks errors raised while pulling chunks off an already
/// accepted response, which are reported as interrupted streams.
pub fn classify_reqwest_error(err: &reqwest::Error, url: &str, reading_body: bool) -> NetworkError {
    if err.is_connect() {
        NetworkError::ConnectionFailed {
            url: url.to_string(),
            message: err.to_string(),
        }
    } else if err.is_timeout() {
        NetworkError::Timeout {
            operation: "HTTP request".to_string(),
            duration: Duration::ZERO,
        }
    } else if let Some(status) = err.status() {
        NetworkError::HttpStatus {
            status: status.as_u16(),
            message: err.to_string(),
        }
    } else if err.is_decode() {
        NetworkError::InvalidResponse {
            message: format!("Failed to decode response: {}", err),
        }
    } else if reading_body || err.is_body() {
        NetworkError::StreamInterrupted {
            message: err.to_string(),
        }
    } else {
        NetworkError::Other {
            message: err.to_string(),
        }
    }
}
