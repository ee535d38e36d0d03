//! Error event parser

use serde_json::Value;

use super::decode_payload;
use crate::sse::events::{SseParseError, StreamEvent};
use crate::sse::payloads::ErrorPayload;

/// Message used when the backend sends an error event without a description
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

/// Parse error event
pub(super) fn parse_error_event(event_type: &str, value: Value) -> Result<StreamEvent, SseParseError> {
    let payload: ErrorPayload = decode_payload(event_type, value)?;
    let message = payload
        .error
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_ERROR_MESSAGE.to_string());
    Ok(StreamEvent::Error { message })
}
