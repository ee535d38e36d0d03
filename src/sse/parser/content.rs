//! Answer content parsers: tokens, retrieval progress and sources

use serde_json::Value;

use super::decode_payload;
use crate::sse::events::{SseParseError, StreamEvent};
use crate::sse::payloads::{SearchCompletePayload, SourcesPayload, TokenPayload};

/// Parse token event
pub(super) fn parse_token_event(event_type: &str, value: Value) -> Result<StreamEvent, SseParseError> {
    let payload: TokenPayload = decode_payload(event_type, value)?;
    Ok(StreamEvent::Token {
        content: payload.content.unwrap_or_default(),
    })
}

/// Parse search_complete event
pub(super) fn parse_search_complete_event(
    event_type: &str,
    value: Value,
) -> Result<StreamEvent, SseParseError> {
    let payload: SearchCompletePayload = decode_payload(event_type, value)?;
    Ok(StreamEvent::SearchComplete {
        doc_count: payload.doc_count.unwrap_or(0),
    })
}

/// Parse sources event. A missing or null list is an empty list.
pub(super) fn parse_sources_event(
    event_type: &str,
    value: Value,
) -> Result<StreamEvent, SseParseError> {
    let payload: SourcesPayload = decode_payload(event_type, value)?;
    Ok(StreamEvent::Sources {
        documents: payload.documents.unwrap_or_default(),
    })
}
