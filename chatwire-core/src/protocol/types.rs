//! Wire types for the chat endpoint
//!
//! This module contains the request and response shapes exchanged with the
//! chat service. The design prioritizes:
//! - A flat request body (`{messages, model, max_tokens?, temperature?, stream?}`)
//! - Verbatim round-tripping of non-streaming response bodies
//! - One terminal `ResponseRecord` per request/response cycle

use crate::config::{ConfigValidator, ValidationError};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Lower bound of the accepted sampling temperature
pub const MIN_TEMPERATURE: f32 = 0.0;

/// Upper bound of the accepted sampling temperature
pub const MAX_TEMPERATURE: f32 = 2.0;

/// Largest `max_tokens` value the service accepts
pub const MAX_TOKENS_LIMIT: u32 = 4000;

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User input message
    User,
    /// Assistant (model) response
    Assistant,
    /// System instructions that guide the model's behavior
    System,
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Role of the message sender
    pub role: Role,

    /// Text content of the message
    pub content: String,
}

impl ConversationMessage {
    /// Create a message with an explicit role
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Per-request generation options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Model identifier to use
    pub model: String,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature (0.0 to 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Whether an event stream is requested
    #[serde(default)]
    pub stream: bool,
}

impl RequestOptions {
    /// Create options for a model with every other field left to defaults
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_tokens: None,
            temperature: None,
            stream: false,
        }
    }

    /// Set the maximum tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Request an event-stream response
    pub fn with_streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Check the options against the bounds the service accepts
    pub fn validate(&self) -> Result<(), ValidationError> {
        ConfigValidator::new().validate_options(self)
    }
}

/// Outbound body of `POST /chat`.
///
/// Built once per send and only ever borrowed by the session afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequestPayload {
    /// Messages in the conversation slice being sent
    pub messages: Vec<ConversationMessage>,

    /// Generation options, serialized alongside `messages`
    #[serde(flatten)]
    pub options: RequestOptions,
}

impl ChatRequestPayload {
    /// Model the payload asks for
    pub fn model(&self) -> &str {
        &self.options.model
    }

    /// Whether the payload asks for an event stream
    pub fn is_streaming(&self) -> bool {
        self.options.stream
    }
}

/// Why a response ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinishReason {
    /// Clean completion (`[DONE]` sentinel or server-reported stop)
    Stop,
    /// The byte stream ended without a sentinel
    Eof,
    /// The server reported an error completion
    Error,
    /// Any other server-reported reason, kept verbatim
    #[serde(untagged)]
    Other(String),
}

/// Token counters reported by the server, keyed by counter name
pub type Usage = HashMap<String, serde_json::Value>;

/// Terminal artifact of one request/response cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    /// Generated response text, empty when the body omits it
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,

    /// Model that produced the response, empty when the body omits it
    #[serde(default, deserialize_with = "null_as_empty")]
    pub model: String,

    /// Token usage information (non-streaming only)
    #[serde(default)]
    pub usage: Option<Usage>,

    /// Reason for completion
    #[serde(default)]
    pub finish_reason: Option<FinishReason>,

    /// Cost of the request
    #[serde(default)]
    pub cost: Option<f64>,

    /// Cost per token
    #[serde(default)]
    pub cost_per_token: Option<f64>,

    /// Time the server spent producing the response
    #[serde(default)]
    pub response_time: Option<f64>,
}

impl ResponseRecord {
    /// Whether the stream ended without the completion sentinel
    pub fn is_truncated(&self) -> bool {
        matches!(self.finish_reason, Some(FinishReason::Eof))
    }

    /// Read a usage counter, treating absent or non-numeric values as zero
    pub fn usage_counter(&self, name: &str) -> u64 {
        self.usage
            .as_ref()
            .and_then(|usage| usage.get(name))
            .and_then(|value| {
                value
                    .as_u64()
                    .or_else(|| value.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64))
            })
            .unwrap_or(0)
    }
}

/// Error body returned with non-success statuses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error message
    pub error: String,

    /// Additional error details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_serializes_flat() {
        let payload = ChatRequestPayload {
            messages: vec![ConversationMessage::user("hi")],
            options: RequestOptions::new("gpt-4")
                .with_max_tokens(150)
                .with_temperature(0.5)
                .with_streaming(true),
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({
                "messages": [{"role": "user", "content": "hi"}],
                "model": "gpt-4",
                "max_tokens": 150,
                "temperature": 0.5,
                "stream": true
            })
        );
    }

    #[test]
    fn test_payload_omits_absent_options() {
        let payload = ChatRequestPayload {
            messages: vec![],
            options: RequestOptions::new("m"),
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert!(value.get("max_tokens").is_none());
        assert!(value.get("temperature").is_none());
        assert_eq!(value["stream"], json!(false));
    }

    #[test]
    fn test_response_record_minimal_body() {
        let record: ResponseRecord =
            serde_json::from_value(json!({"message": "hi", "model": "x"})).unwrap();
        assert_eq!(record.message, "hi");
        assert_eq!(record.model, "x");
        assert!(record.usage.is_none());
        assert!(record.finish_reason.is_none());
        assert!(!record.is_truncated());
    }

    #[test]
    fn test_response_record_missing_or_null_message() {
        let record: ResponseRecord = serde_json::from_value(json!({"model": "x"})).unwrap();
        assert_eq!(record.message, "");
        assert_eq!(record.model, "x");

        let record: ResponseRecord =
            serde_json::from_value(json!({"message": null, "model": null})).unwrap();
        assert_eq!(record.message, "");
        assert_eq!(record.model, "");

        // A non-string message is still malformed
        assert!(serde_json::from_value::<ResponseRecord>(json!({"message": 7})).is_err());
    }

    #[test]
    fn test_finish_reason_keeps_unknown_values() {
        let reason: FinishReason = serde_json::from_value(json!("length")).unwrap();
        assert_eq!(reason, FinishReason::Other("length".to_string()));

        let reason: FinishReason = serde_json::from_value(json!("eof")).unwrap();
        assert_eq!(reason, FinishReason::Eof);
        assert_eq!(serde_json::to_value(FinishReason::Stop).unwrap(), json!("stop"));
    }

    #[test]
    fn test_usage_counter_defaults_to_zero() {
        let record: ResponseRecord = serde_json::from_value(json!({
            "message": "",
            "model": "x",
            "usage": {"prompt_tokens": 12, "total_tokens": 30.0, "completion_tokens": "n/a"}
        }))
        .unwrap();

        assert_eq!(record.usage_counter("prompt_tokens"), 12);
        assert_eq!(record.usage_counter("total_tokens"), 30);
        assert_eq!(record.usage_counter("completion_tokens"), 0);
        assert_eq!(record.usage_counter("missing"), 0);
    }
}
