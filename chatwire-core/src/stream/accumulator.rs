//! Folding increments into the terminal response record

use super::decoder::Increment;
use crate::protocol::types::{FinishReason, ResponseRecord};

/// Running state of a streamed response
#[derive(Debug, Clone)]
pub struct ResponseAccumulator {
    requested_model: String,
    model_hint: Option<String>,
    message: String,
    increments: usize,
}

impl ResponseAccumulator {
    /// Start folding a response for the model the request asked for
    pub fn new(requested_model: impl Into<String>) -> Self {
        Self {
            requested_model: requested_model.into(),
            model_hint: None,
            message: String::new(),
            increments: 0,
        }
    }

    /// Fold one increment in arrival order
    pub fn apply(&mut self, increment: &Increment) {
        if increment.has_text() {
            self.message.push_str(&increment.text);
            self.increments += 1;
        }
        if let Some(model) = increment.model_hint.as_deref().filter(|m| !m.is_empty()) {
            self.model_hint = Some(model.to_string());
        }
    }

    /// Text accumulated so far
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Number of non-empty increments folded so far
    pub fn increments(&self) -> usize {
        self.increments
    }

    /// Model attribution as of now
    pub fn model(&self) -> &str {
        self.model_hint.as_deref().unwrap_or(&self.requested_model)
    }

    /// Produce the record.
    ///
    /// No frame format carries usage or cost, so those fields stay empty on
    /// the streaming path.
    pub fn finish(self, reason: FinishReason) -> ResponseRecord {
        let model = self.model_hint.unwrap_or(self.requested_model);
        ResponseRecord {
            message: self.message,
            model,
            usage: None,
            finish_reason: Some(reason),
            cost: None,
            cost_per_token: None,
            response_time: None,
        }
    }
}
