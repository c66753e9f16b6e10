//! Request payload construction

use super::types::{ChatRequestPayload, ConversationMessage, RequestOptions, Role};
use serde::{Deserialize, Serialize};

/// Fallback for `max_tokens` when the caller leaves it unset
pub const DEFAULT_MAX_TOKENS: u32 = 150;

/// Fallback for `temperature` when the caller leaves it unset
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Which part of the conversation is sent with a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryPolicy {
    /// Send every message in the conversation
    #[default]
    Full,
    /// Send only the newest user message
    LatestUserMessage,
}

/// Builds outbound payloads from a conversation and caller options.
///
/// Construction is pure: nothing is validated and nothing is sent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestCodec {
    max_tokens: u32,
    temperature: f32,
}

impl Default for RequestCodec {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl RequestCodec {
    /// Codec using the fixed defaults (150 tokens, temperature 0.7)
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec using configured fallbacks instead of the fixed ones
    pub fn with_defaults(max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
        }
    }

    /// Build the payload for one send
    pub fn build(
        &self,
        conversation: &[ConversationMessage],
        options: &RequestOptions,
        policy: HistoryPolicy,
    ) -> ChatRequestPayload {
        let messages = match policy {
            HistoryPolicy::Full => conversation.to_vec(),
            HistoryPolicy::LatestUserMessage => conversation
                .iter()
                .rev()
                .find(|message| message.role == Role::User)
                .cloned()
                .into_iter()
                .collect(),
        };

        ChatRequestPayload {
            messages,
            options: RequestOptions {
                model: options.model.clone(),
                max_tokens: Some(options.max_tokens.unwrap_or(self.max_tokens)),
                temperature: Some(options.temperature.unwrap_or(self.temperature)),
                stream: options.stream,
            },
        }
    }
}
