use crate::error::StreamError;
use crate::sse::{SourceDocument, StreamEvent};

/// Lifecycle state of one assistant answer
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TurnStatus {
    /// Receiving tokens
    #[default]
    Open,
    /// Backend sent `done`
    Done,
    /// Transport ended before any `done` or `error` event arrived
    Closed,
    /// Backend `error` event or transport failure
    Failed(StreamError),
}

impl TurnStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TurnStatus::Open)
    }
}

/// One assistant answer being assembled from stream events.
///
/// Text is append-only while the turn is open. Once the status leaves
/// [`TurnStatus::Open`] the turn is frozen: every later mutation is ignored.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConversationTurn {
    pub text: String,
    /// Set at most once, and only from a non-empty `sources` event
    pub sources: Option<Vec<SourceDocument>>,
    pub status: TurnStatus,
}

impl ConversationTurn {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event into the turn, returning the new turn.
    pub fn apply(mut self, event: &StreamEvent) -> Self {
        self.apply_mut(event);
        self
    }

    /// In-place form of [`ConversationTurn::apply`].
    ///
    /// Returns `true` if the event changed the turn.
    pub fn apply_mut(&mut self, event: &StreamEvent) -> bool {
        if self.is_terminal() {
            tracing::debug!(
                event_type = event.event_type_name(),
                "ignoring event for finished turn"
            );
            return false;
        }

        match event {
            StreamEvent::Token { content } => {
                if content.is_empty() {
                    return false;
                }
                self.text.push_str(content);
                true
            }
            StreamEvent::SearchComplete { doc_count } => {
                tracing::debug!(doc_count, "retrieval complete");
                false
            }
            StreamEvent::Sources { documents } => {
                if documents.is_empty() || self.sources.is_some() {
                    return false;
                }
                self.sources = Some(documents.clone());
                true
            }
            StreamEvent::Done => {
                self.status = TurnStatus::Done;
                true
            }
            StreamEvent::Error { message } => {
                self.status = TurnStatus::Failed(StreamError::application(message.clone()));
                true
            }
            StreamEvent::Unknown { event_type } => {
                tracing::debug!(event_type = %event_type, "ignoring unknown event type");
                false
            }
        }
    }

    /// Mark an open turn as failed. No effect on a finished turn.
    pub fn fail(&mut self, error: StreamError) {
        if !self.is_terminal() {
            self.status = TurnStatus::Failed(error);
        }
    }

    /// Mark an open turn as ended by transport closure. No effect on a finished turn.
    pub fn close(&mut self) {
        if !self.is_terminal() {
            self.status = TurnStatus::Closed;
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn error(&self) -> Option<&StreamError> {
        match &self.status {
            TurnStatus::Failed(err) => Some(err),
            _ => None,
        }
    }
}
