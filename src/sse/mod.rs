//! SSE (Server-Sent Events) stream consumer
//!
//! Consumes the chunked body of the `/rag/chat` endpoint. Framing:
//! - events are separated by a blank line (`\n\n`)
//! - each event is a single `data: <json>` line
//! - the JSON `type` field selects the event variant
//! - anything else (comments, `event:` lines, broken JSON) is skipped
//!
//! # Module structure
//! - `events` - Event type definitions (StreamEvent, SourceDocument, SseParseError)
//! - `payloads` - Internal payload deserialization structs
//! - `parser` - Segment parsing (parse_segment, parse_sse_event)
//! - `decoder` - Incremental UTF-8 decoding across chunk boundaries
//! - `consumer` - StreamConsumer: buffering, splitting and end-of-stream flush

mod consumer;
mod decoder;
mod events;
mod parser;
mod payloads;

// Re-export public types
pub use consumer::{StreamConsumer, EVENT_SEPARATOR};
pub use decoder::Utf8StreamDecoder;
pub use events::{SourceDocument, SseParseError, StreamEvent};
pub use parser::{parse_segment, parse_sse_event, DATA_PREFIX, UNKNOWN_ERROR_MESSAGE};
