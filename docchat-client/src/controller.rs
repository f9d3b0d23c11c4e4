//! The chat stream controller: request lifecycle, read loop, and cancellation.
//!
//! A [`ChatStream`] owns one read loop. The loop is the only writer of the
//! decoder carry-over, the line buffer, and the [`MessageAccumulator`]; the
//! caller sees [`ChatUpdate`]s and the final snapshot. The only state shared
//! with the outside is the [`CancelHandle`].

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use docchat_types::{ApiError, ChatUpdate, Citation, MessageAccumulator, MessageDelta, MessageStatus};
use futures::{Stream, StreamExt};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::pipeline::EventPipeline;

/// Message used when the body ends without a `done` event.
pub const ENDED_EARLY: &str = "stream ended before completion";

/// Lifecycle state of a chat stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamState {
    /// Created, request not yet dispatched.
    Idle,
    /// Request dispatched, waiting for response headers.
    Connecting,
    /// Reading the response body.
    Streaming,
    /// A `done` event was applied.
    Completed,
    /// The caller cancelled.
    Cancelled,
    /// The request or the read failed.
    Errored,
}

impl StreamState {
    /// Whether this state is absorbing.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Errored)
    }

    /// Whether the state machine allows moving from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: StreamState) -> bool {
        use StreamState::*;
        matches!(
            (self, next),
            (Idle, Connecting)
                | (Connecting, Streaming | Cancelled | Errored)
                | (Streaming, Completed | Cancelled | Errored)
        )
    }

    fn terminal_for(status: &MessageStatus) -> Self {
        match status {
            MessageStatus::Completed => Self::Completed,
            MessageStatus::Cancelled => Self::Cancelled,
            MessageStatus::Errored(_) => Self::Errored,
            // The loop only reports terminal messages.
            MessageStatus::Streaming => Self::Errored,
        }
    }
}

/// Publish a transition if the state machine allows it.
fn advance(state: &watch::Sender<StreamState>, next: StreamState) {
    state.send_if_modified(|current| {
        if current.can_transition_to(next) {
            tracing::debug!(from = ?*current, to = ?next, "chat stream transition");
            *current = next;
            true
        } else {
            false
        }
    });
}

/// Cloneable, idempotent cancellation signal for one chat stream.
///
/// Safe to trigger zero, one, or many times, from any thread.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    /// Create an untriggered handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Later calls have no further effect.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl From<CancellationToken> for CancelHandle {
    fn from(token: CancellationToken) -> Self {
        Self { token }
    }
}

/// Callback-style consumer of a chat stream.
///
/// Every method defaults to a no-op. Exactly one of `on_done`, `on_error`,
/// and `on_cancelled` is called, after every token and citation callback.
pub trait ChatHandler {
    /// Text appended to the answer.
    fn on_token(&mut self, _token: &str) {}
    /// The citation set for the answer.
    fn on_citations(&mut self, _citations: &[Citation]) {}
    /// The stream completed normally.
    fn on_done(&mut self, _message: &MessageAccumulator) {}
    /// The request or the read failed.
    fn on_error(&mut self, _error: &str) {}
    /// The caller cancelled the stream.
    fn on_cancelled(&mut self, _message: &MessageAccumulator) {}
}

impl ChatHandler for () {}

/// A single in-flight chat answer, as a stream of [`ChatUpdate`]s.
///
/// The request is dispatched when the stream is first polled. The stream
/// yields token and citation updates in arrival order and ends with exactly
/// one [`ChatUpdate::Finished`]. Dropping it drops the response body.
pub struct ChatStream {
    id: String,
    cancel: CancelHandle,
    state: watch::Receiver<StreamState>,
    updates: Pin<Box<dyn Stream<Item = ChatUpdate> + Send>>,
    outcome: Option<MessageAccumulator>,
}

impl std::fmt::Debug for ChatStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatStream")
            .field("id", &self.id)
            .field("state", &*self.state.borrow())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl ChatStream {
    /// Build a stream whose body comes from `connect`.
    ///
    /// `connect` covers dispatch up to response headers; its error ends the
    /// stream as [`MessageStatus::Errored`] before any token is delivered.
    pub fn connect<F, S>(id: impl Into<String>, connect: F) -> Self
    where
        F: Future<Output = Result<S, ApiError>> + Send + 'static,
        S: Stream<Item = Result<Bytes, ApiError>> + Send + 'static,
    {
        let id = id.into();
        let cancel = CancelHandle::new();
        let (state_tx, state_rx) = watch::channel(StreamState::Idle);
        let updates = read_loop(id.clone(), connect, cancel.token.clone(), state_tx);
        Self {
            id,
            cancel,
            state: state_rx,
            updates: Box::pin(updates),
            outcome: None,
        }
    }

    /// Build a stream over an already-open body.
    pub fn from_byte_stream<S, E>(id: impl Into<String>, body: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        let body = body.map(|chunk| chunk.map_err(|e| ApiError::Network(Box::new(e))));
        Self::connect(id, async move { Ok::<_, ApiError>(body) })
    }

    /// Client-side id of the message being streamed.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// A handle that cancels this stream.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Request cancellation; equivalent to `cancel_handle().cancel()`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }

    /// A receiver that observes every state change.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<StreamState> {
        self.state.clone()
    }

    /// The final message, once [`ChatUpdate::Finished`] has been yielded.
    #[must_use]
    pub fn outcome(&self) -> Option<&MessageAccumulator> {
        self.outcome.as_ref()
    }

    /// Consume the stream, dispatching every update to `handler`, and return
    /// the final message.
    pub async fn drive<H>(mut self, handler: &mut H) -> MessageAccumulator
    where
        H: ChatHandler + ?Sized,
    {
        while let Some(update) = self.next().await {
            match update {
                ChatUpdate::Token(token) => handler.on_token(&token),
                ChatUpdate::Citations(citations) => handler.on_citations(&citations),
                ChatUpdate::Finished(message) => {
                    match &message.status {
                        MessageStatus::Completed => handler.on_done(&message),
                        MessageStatus::Errored(error) => handler.on_error(error),
                        MessageStatus::Cancelled => handler.on_cancelled(&message),
                        MessageStatus::Streaming => {}
                    }
                    return message;
                }
            }
        }
        // Finished was already consumed by an earlier poll.
        self.outcome.take().unwrap_or_else(|| {
            let mut message = MessageAccumulator::new(self.id.clone());
            message.fail(ENDED_EARLY);
            message
        })
    }

    /// Consume the stream and return the final message.
    pub async fn finish(self) -> MessageAccumulator {
        self.drive(&mut ()).await
    }
}

impl Stream for ChatStream {
    type Item = ChatUpdate;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<ChatUpdate>> {
        let polled = self.updates.as_mut().poll_next(cx);
        if let Poll::Ready(Some(ChatUpdate::Finished(message))) = &polled {
            self.outcome = Some(message.clone());
        }
        polled
    }
}

/// The read loop. Cancellation is checked before each read, raced against
/// each read, and checked again before each update is handed out.
fn read_loop<F, S>(
    id: String,
    connect: F,
    cancel: CancellationToken,
    state: watch::Sender<StreamState>,
) -> impl Stream<Item = ChatUpdate> + Send + 'static
where
    F: Future<Output = Result<S, ApiError>> + Send + 'static,
    S: Stream<Item = Result<Bytes, ApiError>> + Send + 'static,
{
    async_stream::stream! {
        let mut message = MessageAccumulator::new(id);
        advance(&state, StreamState::Connecting);

        let connected = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            result = connect => Some(result),
        };

        match connected {
            None => {
                message.cancel();
            }
            Some(Err(e)) => {
                tracing::warn!(message_id = %message.id, error = %e, "chat request failed");
                message.fail(e.message());
            }
            Some(Ok(body)) => {
                advance(&state, StreamState::Streaming);
                let mut body = std::pin::pin!(body);
                let mut pipeline = EventPipeline::new();

                while !message.is_terminal() {
                    if cancel.is_cancelled() {
                        message.cancel();
                        break;
                    }

                    let next = tokio::select! {
                        biased;
                        () = cancel.cancelled() => None,
                        next = body.next() => Some(next),
                    };

                    let (events, ended) = match next {
                        None => {
                            message.cancel();
                            break;
                        }
                        Some(Some(Ok(chunk))) => (pipeline.push(&chunk), false),
                        Some(Some(Err(e))) => {
                            tracing::warn!(message_id = %message.id, error = %e, "chat stream read failed");
                            message.fail(e.message());
                            break;
                        }
                        Some(None) => (pipeline.finish(), true),
                    };

                    for event in events {
                        if cancel.is_cancelled() {
                            message.cancel();
                            break;
                        }
                        match message.apply(event) {
                            Some(MessageDelta::Token(token)) => yield ChatUpdate::Token(token),
                            Some(MessageDelta::Citations(citations)) => {
                                yield ChatUpdate::Citations(citations)
                            }
                            Some(MessageDelta::Completed) | None => {}
                        }
                        if message.is_terminal() {
                            break;
                        }
                    }

                    if ended && !message.is_terminal() {
                        if cancel.is_cancelled() {
                            message.cancel();
                        } else {
                            message.fail(ENDED_EARLY);
                        }
                    }
                }
            }
        }

        let terminal = StreamState::terminal_for(&message.status);
        advance(&state, terminal);
        tracing::debug!(
            message_id = %message.id,
            state = ?terminal,
            content_len = message.content.len(),
            "chat stream finished"
        );
        yield ChatUpdate::Finished(message);
    }
}
