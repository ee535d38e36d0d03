//! SSE segment parsing logic
//!
//! A segment is the text between two blank-line separators. Parsing a
//! segment is pure: it either yields one typed [`StreamEvent`] or an
//! [`SseParseError`] that the consumer logs and drops.

mod content;
mod misc;

use serde_json::Value;

use crate::sse::events::{SseParseError, StreamEvent};

use content::{parse_search_complete_event, parse_sources_event, parse_token_event};
use misc::parse_error_event;
pub use misc::UNKNOWN_ERROR_MESSAGE;

/// Literal prefix every event line carries
pub const DATA_PREFIX: &str = "data: ";

/// Parse one raw segment (without its `\n\n` separator).
///
/// Returns:
/// - `Ok(Some(event))` - the segment carried a well-formed event
/// - `Ok(None)` - the segment was blank
/// - `Err(error)` - the segment is malformed and must be skipped
pub fn parse_segment(segment: &str) -> Result<Option<StreamEvent>, SseParseError> {
    let trimmed = segment.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let data = trimmed
        .strip_prefix(DATA_PREFIX)
        .ok_or(SseParseError::MissingDataPrefix)?;

    parse_sse_event(data).map(Some)
}

/// Parse the JSON document of a `data: ` line into a typed StreamEvent
pub fn parse_sse_event(data: &str) -> Result<StreamEvent, SseParseError> {
    let value: Value = serde_json::from_str(data).map_err(|e| SseParseError::InvalidJson {
        source: e.to_string(),
    })?;

    let event_type = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(SseParseError::MissingType)?
        .to_string();

    match event_type.as_str() {
        "token" => parse_token_event(&event_type, value),
        "search_complete" => parse_search_complete_event(&event_type, value),
        "sources" => parse_sources_event(&event_type, value),
        "done" => Ok(StreamEvent::Done),
        "error" => parse_error_event(&event_type, value),
        // Unknown types pass through so newer backends don't break older clients
        _ => Ok(StreamEvent::Unknown { event_type }),
    }
}

/// Deserialize a payload struct, tagging failures with the event type
pub(super) fn decode_payload<T: serde::de::DeserializeOwned>(
    event_type: &str,
    value: Value,
) -> Result<T, SseParseError> {
    serde_json::from_value(value).map_err(|e| SseParseError::InvalidPayload {
        event_type: event_type.to_string(),
        source: e.to_string(),
    })
}
