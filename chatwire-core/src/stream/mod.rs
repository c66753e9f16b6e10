//! Event-stream consumption
//!
//! This module turns a chunked byte stream into ordered text increments and a
//! final `ResponseRecord`:
//! - [`FrameSplitter`] reassembles blank-line delimited frames
//! - [`decode_frame`] extracts at most one [`Increment`] per frame
//! - [`ResponseAccumulator`] folds increments into the record
//!
//! [`AttemptState`] tracks where a single request/response cycle is.

pub mod accumulator;
pub mod decoder;
pub mod splitter;

pub use accumulator::ResponseAccumulator;
pub use decoder::{
    decode_frame, DecodedPayload, FrameOutcome, Increment, DATA_PREFIX, DONE_SENTINEL,
    TEXT_FIELD_PRECEDENCE,
};
pub use splitter::{FrameSplitter, FRAME_SEPARATOR};

use crate::protocol::types::FinishReason;
use std::fmt;

/// Lifecycle of one request/response cycle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AttemptState {
    #[default]
    Idle,
    Sending,
    StreamingFrames,
    Completed(FinishReason),
    Failed,
    Cancelled,
}

impl AttemptState {
    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed | Self::Cancelled)
    }

    /// Whether moving to `next` is a legal transition
    pub fn can_transition_to(&self, next: &AttemptState) -> bool {
        use AttemptState::*;

        match (self, next) {
            (current, _) if current.is_terminal() => false,
            (_, Cancelled) => true,
            (Idle, Sending) => true,
            (Sending, StreamingFrames) => true,
            // Complete bodies finish straight from `Sending`.
            (Sending, Completed(_)) => true,
            (Sending, Failed) => true,
            (StreamingFrames, Completed(_)) => true,
            (StreamingFrames, Failed) => true,
            _ => false,
        }
    }

    /// Move to `next`, returning whether the move was legal.
    ///
    /// Illegal moves leave the state untouched.
    pub fn advance(&mut self, next: AttemptState) -> bool {
        if !self.can_transition_to(&next) {
            tracing::warn!("Ignoring illegal attempt transition {} -> {}", self, next);
            return false;
        }
        *self = next;
        true
    }
}

impl fmt::Display for AttemptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Sending => write!(f, "sending"),
            Self::StreamingFrames => write!(f, "streaming"),
            Self::Completed(FinishReason::Stop) => write!(f, "completed(stop)"),
            Self::Completed(FinishReason::Eof) => write!(f, "completed(eof)"),
            Self::Completed(FinishReason::Error) => write!(f, "completed(error)"),
            Self::Completed(FinishReason::Other(reason)) => write!(f, "completed({})", reason),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}
