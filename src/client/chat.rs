//! Driving a chat response body through the stream consumer.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::Stream;
use futures_util::StreamExt;
use tokio::sync::watch;

use crate::error::{NetworkError, StreamError};
use crate::models::ConversationTurn;
use crate::sse::{StreamConsumer, StreamEvent};

/// Chunked response body, with transport errors already classified
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, NetworkError>> + Send>>;

/// Cloneable handle that asks a [`ChatStream`] to stop reading.
///
/// Cancelling leaves the turn as it was; nothing is rolled back.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// How [`ChatStream::drive`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    /// The turn reached a terminal status
    Finished,
    /// A [`CancelHandle`] fired; the turn keeps whatever state it had
    Cancelled,
}

enum Step {
    Cancelled,
    Next(Option<Result<StreamEvent, StreamError>>),
}

/// One streamed answer: a response body plus the consumer parsing it.
pub struct ChatStream {
    /// `None` once the body has ended or been released
    body: Option<ByteStream>,
    consumer: StreamConsumer,
    /// Parsed events not yet handed out
    pending: VecDeque<StreamEvent>,
    idle_timeout: Option<Duration>,
    cancel: CancelHandle,
}

impl ChatStream {
    /// Wrap any chunk stream, e.g. a response body or a test fixture.
    pub fn from_body<S>(body: S) -> Self
    where
        S: Stream<Item = Result<Bytes, NetworkError>> + Send + 'static,
    {
        Self {
            body: Some(Box::pin(body)),
            consumer: StreamConsumer::new(),
            pending: VecDeque::new(),
            idle_timeout: None,
            cancel: CancelHandle::new(),
        }
    }

    /// Fail the stream if no chunk arrives within `timeout`.
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Use an existing cancel handle, so it can be created before the request.
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Next event in arrival order.
    ///
    /// Returns `None` once the body has ended and every buffered event has
    /// been handed out. A transport error is returned once, after which the
    /// stream is released and yields `None`.
    pub async fn next_event(&mut self) -> Option<Result<StreamEvent, StreamError>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(Ok(event));
            }

            let body = self.body.as_mut()?;
            let next = match self.idle_timeout {
                Some(limit) => match tokio::time::timeout(limit, body.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        self.release();
                        return Some(Err(StreamError::Transport(NetworkError::Timeout {
                            operation: "Waiting for stream data".to_string(),
                            duration: limit,
                        })));
                    }
                },
                None => body.next().await,
            };

            match next {
                Some(Ok(chunk)) => {
                    let events = self.consumer.feed(&chunk);
                    self.pending.extend(events);
                }
                Some(Err(err)) => {
                    tracing::warn!(error = %err, "chat stream transport failure");
                    self.release();
                    return Some(Err(StreamError::Transport(err)));
                }
                None => {
                    self.body = None;
                    let events = self.consumer.finalize();
                    self.pending.extend(events);
                }
            }
        }
    }

    /// Stop reading: drop the body (closing the connection) and any
    /// buffered, unparsed bytes.
    pub fn release(&mut self) {
        if self.body.take().is_some() {
            tracing::debug!("chat stream released");
        }
        self.pending.clear();
        self.consumer.reset();
    }

    /// True once nothing more can come out of [`ChatStream::next_event`]
    pub fn is_finished(&self) -> bool {
        self.body.is_none() && self.pending.is_empty()
    }

    /// Apply events to `turn` until it is terminal or the body ends.
    ///
    /// `observer` sees every event right after it was applied. When the turn
    /// turns terminal the stream is released without waiting for the
    /// transport to close. A body that ends without `done` closes the turn;
    /// a transport error fails it.
    pub async fn drive<F>(&mut self, turn: &mut ConversationTurn, mut observer: F) -> DriveOutcome
    where
        F: FnMut(&StreamEvent, &ConversationTurn),
    {
        let mut cancel_rx = self.cancel.subscribe();

        loop {
            if turn.is_terminal() {
                self.release();
                return DriveOutcome::Finished;
            }
            if *cancel_rx.borrow() {
                self.release();
                return DriveOutcome::Cancelled;
            }

            let step = tokio::select! {
                biased;
                _ = wait_cancelled(&mut cancel_rx) => Step::Cancelled,
                next = self.next_event() => Step::Next(next),
            };

            match step {
                Step::Cancelled => {
                    tracing::info!("chat stream cancelled");
                    self.release();
                    return DriveOutcome::Cancelled;
                }
                Step::Next(Some(Ok(event))) => {
                    turn.apply_mut(&event);
                    observer(&event, turn);
                }
                Step::Next(Some(Err(err))) => {
                    turn.fail(err);
                    return DriveOutcome::Finished;
                }
                Step::Next(None) => {
                    turn.close();
                    return DriveOutcome::Finished;
                }
            }
        }
    }
}

impl std::fmt::Debug for ChatStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatStream")
            .field("open", &self.body.is_some())
            .field("pending", &self.pending.len())
            .field("idle_timeout", &self.idle_timeout)
            .finish()
    }
}

async fn wait_cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            // Sender gone: cancellation can no longer happen
            std::future::pending::<()>().await;
        }
    }
}
