//! A chat against one knowledge base.
//!
//! [`ChatSession`] owns the [`Conversation`] transcript and routes every
//! stream event to the turn that issued the request, so an answer still
//! arriving for an older query never lands on a newer one.

use std::time::Duration;

use crate::client::{CancelHandle, ClientError, DriveOutcome, IbotClient};
use crate::config::ClientConfig;
use crate::error::{NetworkError, StreamError};
use crate::models::{ChatRequest, Conversation, ConversationTurn, TurnId, DEFAULT_TOP_K};
use crate::sse::StreamEvent;

#[derive(Debug)]
pub struct ChatSession {
    client: IbotClient,
    knowledge_base_id: i64,
    top_k: u32,
    idle_timeout: Option<Duration>,
    conversation: Conversation,
}

impl ChatSession {
    pub fn new(client: IbotClient, knowledge_base_id: i64) -> Self {
        Self {
            client,
            knowledge_base_id,
            top_k: DEFAULT_TOP_K,
            idle_timeout: None,
            conversation: Conversation::new(),
        }
    }

    pub fn from_config(config: &ClientConfig, knowledge_base_id: i64) -> Self {
        Self::new(IbotClient::from_config(config), knowledge_base_id)
            .with_top_k(config.top_k)
            .with_idle_timeout(config.idle_timeout)
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn knowledge_base_id(&self) -> i64 {
        self.knowledge_base_id
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn turn(&self, id: TurnId) -> Option<&ConversationTurn> {
        self.conversation.turn(id)
    }

    /// Ask a question and stream the answer into a new turn.
    ///
    /// See [`ChatSession::send_cancellable`].
    pub async fn send<F>(
        &mut self,
        query: &str,
        observer: F,
    ) -> Result<(TurnId, DriveOutcome), ClientError>
    where
        F: FnMut(&StreamEvent, &ConversationTurn),
    {
        self.send_cancellable(query, CancelHandle::new(), observer)
            .await
    }

    /// Ask a question, stopping early if `cancel` fires.
    ///
    /// An empty query is rejected before any turn is created. Once the turn
    /// exists every failure is recorded on it rather than returned: a
    /// rejected request fails the turn with a transport error, and backend
    /// `error` events fail it with an application error.
    pub async fn send_cancellable<F>(
        &mut self,
        query: &str,
        cancel: CancelHandle,
        observer: F,
    ) -> Result<(TurnId, DriveOutcome), ClientError>
    where
        F: FnMut(&StreamEvent, &ConversationTurn),
    {
        let query = query.trim();
        if query.is_empty() {
            return Err(ClientError::InvalidInput(
                "query must not be empty".to_string(),
            ));
        }

        let open_before = self.conversation.open_turn_count();
        let (id, turn) = self.conversation.open(query);
        tracing::debug!(turn = id.index(), open_before, "opening chat turn");

        let request =
            ChatRequest::new(self.knowledge_base_id, query).with_top_k(self.top_k);
        let mut stream = match self.client.chat(&request).await {
            Ok(stream) => stream
                .with_idle_timeout(self.idle_timeout)
                .with_cancel_handle(cancel),
            Err(err) => {
                tracing::warn!(error = %err, "chat request failed");
                turn.fail(StreamError::Transport(request_failure(err)));
                return Ok((id, DriveOutcome::Finished));
            }
        };

        let outcome = stream.drive(turn, observer).await;
        tracing::debug!(turn = id.index(), ?outcome, status = ?turn.status, "chat turn ended");
        Ok((id, outcome))
    }
}

fn request_failure(err: ClientError) -> NetworkError {
    match err {
        ClientError::Network(err) => err,
        other => NetworkError::Other {
            message: other.to_string(),
        },
    }
}
