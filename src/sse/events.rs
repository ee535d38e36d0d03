//! SSE event types and definitions
//!
//! Contains the StreamEvent enum with every event variant the `/rag/chat`
//! endpoint emits, plus the error type for segments that fail to parse.

use serde::{Deserialize, Serialize};

/// A backend document cited as grounding for an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

impl SourceDocument {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// File name to use when saving this document locally.
    ///
    /// Falls back to `document_<id>.pdf` when the backend sent no name.
    pub fn download_name(&self) -> String {
        if self.name.trim().is_empty() {
            format!("document_{}.pdf", self.id)
        } else {
            self.name.clone()
        }
    }
}

/// Typed events from the chat stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Incremental answer text
    Token { content: String },
    /// Retrieval finished; informational only
    SearchComplete { doc_count: u64 },
    /// Documents used to ground the answer (may be empty)
    Sources { documents: Vec<SourceDocument> },
    /// Stream completed successfully
    Done,
    /// Error reported in-band by the backend
    Error { message: String },
    /// A `type` this client does not understand
    Unknown { event_type: String },
}

impl StreamEvent {
    /// Returns the event type name as a string for debugging purposes.
    pub fn event_type_name(&self) -> &str {
        match self {
            StreamEvent::Token { .. } => "token",
            StreamEvent::SearchComplete { .. } => "search_complete",
            StreamEvent::Sources { .. } => "sources",
            StreamEvent::Done => "done",
            StreamEvent::Error { .. } => "error",
            StreamEvent::Unknown { event_type } => event_type,
        }
    }

    /// True for events that end the turn they are applied to.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Done | StreamEvent::Error { .. })
    }
}

/// Errors that can occur while parsing one SSE segment.
///
/// These are always absorbed by the consumer; they are surfaced only
/// through logging.
#[derive(Debug, Clone, PartialEq)]
pub enum SseParseError {
    /// Segment did not start with the `data: ` prefix
    MissingDataPrefix,
    /// Invalid JSON in data payload
    InvalidJson { source: String },
    /// Payload is JSON but carries no string `type` field
    MissingType,
    /// Known event type with fields of the wrong shape
    InvalidPayload { event_type: String, source: String },
}

impl std::fmt::Display for SseParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SseParseError::MissingDataPrefix => write!(f, "Segment has no 'data: ' prefix"),
            SseParseError::InvalidJson { source } => write!(f, "Invalid JSON: {}", source),
            SseParseError::MissingType => write!(f, "Payload has no 'type' field"),
            SseParseError::InvalidPayload { event_type, source } => {
                write!(f, "Invalid payload for event '{}': {}", event_type, source)
            }
        }
    }
}

impl std::error::Error for SseParseError {}
