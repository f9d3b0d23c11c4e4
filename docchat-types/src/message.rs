//! The in-flight assistant message and the reducer that folds stream events into it.

use serde::{Deserialize, Serialize};

use crate::types::{Citation, StreamEvent};

/// Lifecycle status of a streamed message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum MessageStatus {
    /// Events are still being applied.
    Streaming,
    /// A `done` event was applied.
    Completed,
    /// The caller cancelled the stream.
    Cancelled,
    /// The request or the read failed with this message.
    Errored(String),
}

impl MessageStatus {
    /// Whether no further events will be applied.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Streaming)
    }
}

/// What an applied event changed, for incremental notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageDelta {
    /// Text appended to the content.
    Token(String),
    /// The citation set was (re)placed.
    Citations(Vec<Citation>),
    /// The message reached [`MessageStatus::Completed`].
    Completed,
}

/// Append-only state of one assistant message while it streams in.
///
/// Content only grows while [`MessageStatus::Streaming`], the status leaves
/// `Streaming` exactly once, and every mutation after that is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageAccumulator {
    /// Client-side id of the message.
    pub id: String,
    /// Concatenation of every applied token.
    pub content: String,
    /// Last citation set received, if any.
    pub citations: Option<Vec<Citation>>,
    /// Current lifecycle status.
    pub status: MessageStatus,
}

impl MessageAccumulator {
    /// A fresh, empty message in [`MessageStatus::Streaming`].
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: String::new(),
            citations: None,
            status: MessageStatus::Streaming,
        }
    }

    /// Whether the message reached a terminal status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Fold one event into the message.
    ///
    /// Returns the change to report, or `None` when the message was already
    /// terminal. A repeated citation set replaces the previous one.
    pub fn apply(&mut self, event: StreamEvent) -> Option<MessageDelta> {
        if self.is_terminal() {
            return None;
        }
        match event {
            StreamEvent::Token { content } => {
                self.content.push_str(&content);
                Some(MessageDelta::Token(content))
            }
            StreamEvent::CitationSet { citations } => {
                self.citations = Some(citations.clone());
                Some(MessageDelta::Citations(citations))
            }
            StreamEvent::Done => {
                self.status = MessageStatus::Completed;
                Some(MessageDelta::Completed)
            }
        }
    }

    /// Move a streaming message to [`MessageStatus::Cancelled`].
    ///
    /// Returns `false` if the message was already terminal.
    pub fn cancel(&mut self) -> bool {
        self.finish(MessageStatus::Cancelled)
    }

    /// Move a streaming message to [`MessageStatus::Errored`].
    ///
    /// Returns `false` if the message was already terminal.
    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        self.finish(MessageStatus::Errored(message.into()))
    }

    fn finish(&mut self, status: MessageStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = status;
        true
    }
}

/// A caller-visible notification from a chat stream.
///
/// Exactly one [`ChatUpdate::Finished`] is delivered per stream, always last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatUpdate {
    /// Text appended to the message.
    Token(String),
    /// The citation set for the message.
    Citations(Vec<Citation>),
    /// The stream reached a terminal status; carries the final message.
    Finished(MessageAccumulator),
}
