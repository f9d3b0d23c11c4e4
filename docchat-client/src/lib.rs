//! HTTP client and streaming chat engine for the docchat API.
//!
//! [`DocChat::send_message`] returns a [`ChatStream`]: the response body is
//! decoded incrementally ([`ChunkDecoder`]), split into `data:` lines
//! ([`LineFramer`]), parsed into events ([`parse_event`]), and folded into a
//! [`MessageAccumulator`](docchat_types::MessageAccumulator). Cancellation
//! goes through a [`CancelHandle`].
//!
//! ```no_run
//! use docchat_client::{ChatUpdate, DocChat};
//! use docchat_types::ChatRequest;
//! use futures::StreamExt;
//!
//! # async fn run() {
//! let client = DocChat::new("http://localhost:8000");
//! let mut stream = client.send_message(ChatRequest::new("conv-id", "Summarize the lease"));
//! while let Some(update) = stream.next().await {
//!     match update {
//!         ChatUpdate::Token(text) => print!("{text}"),
//!         ChatUpdate::Citations(citations) => println!("\n{} sources", citations.len()),
//!         ChatUpdate::Finished(message) => println!("\n{:?}", message.status),
//!     }
//! }
//! # }
//! ```

pub mod client;
pub mod controller;
pub mod conversations;
pub mod decode;
pub mod documents;
pub(crate) mod error;
pub mod framing;
pub mod parse;
pub mod pipeline;

pub use client::{CHAT_REQUEST_FAILED, DocChat};
pub use controller::{CancelHandle, ChatHandler, ChatStream, ENDED_EARLY, StreamState};
pub use decode::ChunkDecoder;
pub use framing::{DATA_PREFIX, LineFramer, data_payload};
pub use parse::parse_event;
pub use pipeline::EventPipeline;

// Re-export docchat-types for convenience
pub use docchat_types::{ApiError, ChatRequest, ChatUpdate, MessageAccumulator, MessageStatus};
