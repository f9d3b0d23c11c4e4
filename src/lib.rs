#![deny(missing_docs)]
//! # docchat
//!
//! Single import surface for the docchat client: wire types from
//! [`docchat_types`] and the HTTP client with its streaming chat engine from
//! [`docchat_client`], plus a `prelude` for the common path.

pub use docchat_client;
pub use docchat_types;

/// Happy-path imports for chatting with a docchat backend.
pub mod prelude {
    pub use docchat_client::{CancelHandle, ChatHandler, ChatStream, DocChat, StreamState};
    pub use docchat_types::{
        ApiError, ChatRequest, ChatUpdate, Citation, Conversation, ConversationDetail, Document,
        MessageAccumulator, MessageStatus, StreamEvent,
    };
}
