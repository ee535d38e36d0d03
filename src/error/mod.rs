//! Error handling for the ibot client.
//!
//! - **Error Categories**: High-level classification for handling decisions
//! - **Network Errors**: connect, timeout, HTTP status, interrupted bodies
//! - **Stream Errors**: how a streamed answer failed (backend vs. transport)
//!
//! Request-level errors of the HTTP client live in [`crate::client::ClientError`],
//! which wraps [`NetworkError`] for everything that went wrong on the wire.
//!
//! # Error Categories
//!
//! | Category | Description | Retryable |
//! |----------|-------------|-----------|
//! | Network | Connection, timeout, interrupted stream | Yes |
//! | Server | HTTP 5xx, unparseable responses | Yes |
//! | Backend | Failure reported by the backend itself | No |
//! | Client | HTTP 4xx | No |
//! | User | Invalid input | No |
//! | Configuration | Config issues | No |

mod category;
mod network;
mod stream;

pub use category::ErrorCategory;
pub use network::{classify_reqwest_error, NetworkError};
pub use stream::StreamError;
