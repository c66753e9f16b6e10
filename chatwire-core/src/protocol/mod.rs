//! Protocol module for chat request/response structures
//!
//! This module defines the data models exchanged with the chat service and the
//! codec that turns a conversation into an outbound payload.

pub mod codec;
pub mod types;

pub use codec::{HistoryPolicy, RequestCodec, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
pub use types::{
    ChatRequestPayload, ConversationMessage, ErrorBody, FinishReason, RequestOptions,
    ResponseRecord, Role, Usage, MAX_TEMPERATURE, MAX_TOKENS_LIMIT, MIN_TEMPERATURE,
};
