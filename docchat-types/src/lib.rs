//! Core types for docchat: the chat stream's wire events, the message
//! reducer, the collaborator records, and the shared error type.
//!
//! This crate has no I/O. The HTTP client and the streaming engine live in
//! `docchat-client`.

pub mod error;
pub mod message;
pub mod types;

pub use error::*;
pub use message::*;
pub use types::*;
