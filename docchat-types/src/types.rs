//! Wire types shared by the chat stream and the collaborator endpoints.

use serde::{Deserialize, Serialize};

// ─── Stream events ───────────────────────────────────────────────────────────

/// A reference to a source excerpt backing part of an assistant answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// 1-based display number, in the order the server sent the set.
    pub number: u32,
    /// Document the excerpt belongs to.
    pub document_id: String,
    /// Original filename of that document.
    pub filename: String,
    /// The excerpt text.
    pub content: String,
    /// Page the excerpt starts on, when the source format has pages.
    pub page_number: Option<u32>,
    /// Section heading the excerpt sits under, if known.
    pub section: Option<String>,
    /// Unique id of the excerpt.
    pub chunk_id: String,
}

impl Citation {
    /// Human-readable source label: `filename[, section][, page N]`.
    #[must_use]
    pub fn location(&self) -> String {
        let mut location = self.filename.clone();
        if let Some(section) = self.section.as_deref().filter(|s| !s.is_empty()) {
            location.push_str(", ");
            location.push_str(section);
        }
        if let Some(page) = self.page_number.filter(|p| *p > 0) {
            location.push_str(&format!(", page {page}"));
        }
        location
    }
}

/// One semantic event decoded from a `data:` line of the chat stream.
///
/// The wire form is an internally tagged JSON record:
///
/// ```text
/// {"type":"token","content":"Hel"}
/// {"type":"citations","citations":[...]}
/// {"type":"done"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// One incremental fragment of assistant text, appended verbatim.
    Token {
        /// The fragment.
        content: String,
    },
    /// The citation set for the answer, in display order.
    #[serde(rename = "citations")]
    CitationSet {
        /// The citations.
        citations: Vec<Citation>,
    },
    /// Terminal marker.
    Done,
}

// ─── Chat request ────────────────────────────────────────────────────────────

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Conversation the message belongs to.
    pub conversation_id: String,
    /// The user's message.
    pub message: String,
    /// Restrict retrieval to these documents, in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_ids: Option<Vec<String>>,
}

impl ChatRequest {
    /// A request against every document of the conversation.
    #[must_use]
    pub fn new(conversation_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            message: message.into(),
            document_ids: None,
        }
    }

    /// Restrict retrieval to the given documents.
    #[must_use]
    pub fn with_documents<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.document_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }
}

/// Error body returned by the backend on non-success statuses.
///
/// `detail` is kept as a raw value because validation failures put an array
/// there instead of a string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    /// Human-readable detail, when the server provided one.
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Extract a non-empty string `detail` from a raw response body.
    #[must_use]
    pub fn detail_from(body: &str) -> Option<String> {
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        match parsed.detail? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }
}

// ─── Documents ───────────────────────────────────────────────────────────────

/// An uploaded document as listed by `GET /api/documents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Document id.
    pub id: String,
    /// Original filename.
    pub filename: String,
    /// `pdf` or `docx`.
    pub file_type: String,
    /// Size in bytes.
    pub file_size: u64,
    /// Page count, for paged formats.
    pub page_count: Option<u32>,
    /// Number of indexed excerpts.
    pub chunk_count: u32,
    /// ISO-8601 creation time.
    pub created_at: String,
}

/// Body of `POST /api/documents/from-text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDocumentFromText {
    /// Text to render into the document.
    pub content: String,
    /// Filename to store it under.
    pub filename: String,
}

// ─── Conversations ───────────────────────────────────────────────────────────

/// Title used when a conversation is created without one.
pub const DEFAULT_CONVERSATION_TITLE: &str = "New Conversation";

/// A conversation summary as listed by `GET /api/conversations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Conversation id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// ISO-8601 creation time.
    pub created_at: String,
    /// ISO-8601 last-update time.
    pub updated_at: String,
    /// Number of stored messages.
    pub message_count: u32,
}

/// A conversation with its stored messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationDetail {
    /// Conversation id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Messages in creation order.
    pub messages: Vec<StoredMessage>,
}

/// Body of `POST /api/conversations` and `PATCH /api/conversations/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTitle {
    /// The title.
    pub title: String,
}

/// Author of a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human.
    User,
    /// The assistant.
    Assistant,
}

/// A persisted message. Citations are stored server-side as a JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Message id.
    pub id: String,
    /// Author.
    pub role: Role,
    /// Full message text.
    pub content: String,
    /// JSON-encoded citation list, if the answer had one.
    pub citations: Option<String>,
    /// ISO-8601 creation time.
    pub created_at: String,
}

impl StoredMessage {
    /// Decode the embedded citation list. A malformed string decodes as `None`.
    #[must_use]
    pub fn parsed_citations(&self) -> Option<Vec<Citation>> {
        self.citations
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }
}
