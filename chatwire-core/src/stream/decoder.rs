//! Frame payload decoding
//!
//! A frame contributes at most one increment. Payloads that are not JSON are
//! delivered as literal text rather than rejected.

use serde_json::Value;

/// Prefix of the line carrying a frame's payload
pub const DATA_PREFIX: &str = "data: ";

/// Payload that marks clean end-of-stream
pub const DONE_SENTINEL: &str = "[DONE]";

/// Fields checked for increment text, first present non-null value wins
pub const TEXT_FIELD_PRECEDENCE: [&str; 3] = ["delta", "message", "text"];

/// Field carrying the model attribution of a frame
pub const MODEL_FIELD: &str = "model";

/// Decoded contribution of one frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Increment {
    /// Text to append, possibly empty
    pub text: String,
    /// Model reported by this frame, if any
    pub model_hint: Option<String>,
}

impl Increment {
    /// Increment carrying text only
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model_hint: None,
        }
    }

    /// Whether the increment carries text for the sink
    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }
}

/// Payload after the structured-parse attempt
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedPayload {
    /// Payload parsed as JSON
    Structured(Value),
    /// Payload kept as trimmed literal text
    Literal(String),
}

impl DecodedPayload {
    /// Try JSON first and fall back to the literal text
    pub fn parse(payload: &str) -> Self {
        match serde_json::from_str::<Value>(payload) {
            Ok(value) => Self::Structured(value),
            Err(e) => {
                tracing::debug!("Frame payload is not JSON, delivering as text: {}", e);
                Self::Literal(payload.to_string())
            }
        }
    }

    /// Reduce the payload to an increment
    pub fn into_increment(self) -> Increment {
        match self {
            Self::Structured(value) => Increment {
                text: structured_text(&value).unwrap_or_default().to_string(),
                model_hint: value
                    .get(MODEL_FIELD)
                    .and_then(Value::as_str)
                    .filter(|model| !model.is_empty())
                    .map(str::to_string),
            },
            Self::Literal(text) => Increment::literal(text),
        }
    }
}

/// What one frame means for the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame carried the completion sentinel
    Done,
    /// The frame carried a payload
    Increment(Increment),
    /// The frame had no data line
    Ignored,
}

/// Decode one frame.
///
/// Only the first data line is read; any further data lines of the same frame
/// are dropped rather than joined.
pub fn decode_frame(frame: &str) -> FrameOutcome {
    let Some(payload) = frame
        .split('\n')
        .find_map(|line| line.strip_prefix(DATA_PREFIX))
    else {
        return FrameOutcome::Ignored;
    };

    let payload = payload.trim();
    if payload == DONE_SENTINEL {
        return FrameOutcome::Done;
    }

    FrameOutcome::Increment(DecodedPayload::parse(payload).into_increment())
}

fn structured_text(value: &Value) -> Option<&str> {
    let candidate = TEXT_FIELD_PRECEDENCE
        .iter()
        .filter_map(|field| value.get(field))
        .find(|candidate| !candidate.is_null())?;

    candidate.as_str().filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn increment_of(frame: &str) -> Increment {
        match decode_frame(frame) {
            FrameOutcome::Increment(increment) => increment,
            other => panic!("expected increment, got {:?}", other),
        }
    }

    #[test_case(r#"data: {"delta":"Hel"}"#, "Hel" ; "delta field")]
    #[test_case(r#"data: {"message":"full"}"#, "full" ; "message field")]
    #[test_case(r#"data: {"text":"plain"}"#, "plain" ; "text field")]
    #[test_case(r#"data: {"delta":"d","message":"m","text":"t"}"#, "d" ; "delta wins")]
    #[test_case(r#"data: {"delta":null,"message":"m"}"#, "m" ; "null is skipped")]
    #[test_case(r#"data: {"delta":"","message":"m"}"#, "" ; "empty delta still wins")]
    #[test_case(r#"data: {"delta":5,"text":"t"}"#, "" ; "non string candidate yields empty")]
    #[test_case(r#"data: {"other":"x"}"#, "" ; "no candidate")]
    #[test_case(r#"data: [1,2]"#, "" ; "json array")]
    #[test_case("data: plain text", "plain text" ; "literal fallback")]
    #[test_case("data:   {broken  ", "{broken" ; "literal is trimmed")]
    fn test_increment_text(frame: &str, expected: &str) {
        assert_eq!(increment_of(frame).text, expected);
    }

    #[test]
    fn test_done_sentinel() {
        assert_eq!(decode_frame("data: [DONE]"), FrameOutcome::Done);
        assert_eq!(decode_frame("event: end\ndata:  [DONE]  "), FrameOutcome::Done);
    }

    #[test]
    fn test_frame_without_data_line_is_ignored() {
        assert_eq!(decode_frame(": keep-alive"), FrameOutcome::Ignored);
        assert_eq!(decode_frame("data:no-space"), FrameOutcome::Ignored);
        assert_eq!(decode_frame(""), FrameOutcome::Ignored);
    }

    #[test]
    fn test_only_first_data_line_is_read() {
        let increment = increment_of("data: {\"delta\":\"a\"}\ndata: {\"delta\":\"b\"}");
        assert_eq!(increment.text, "a");
    }

    #[test]
    fn test_model_hint() {
        let increment = increment_of(r#"data: {"delta":"x","model":"gpt-4o"}"#);
        assert_eq!(increment.model_hint.as_deref(), Some("gpt-4o"));

        let increment = increment_of(r#"data: {"delta":"x","model":""}"#);
        assert_eq!(increment.model_hint, None);

        let increment = increment_of(r#"data: {"model":7}"#);
        assert_eq!(increment.model_hint, None);
    }

    #[test]
    fn test_tagged_payload() {
        assert_eq!(
            DecodedPayload::parse("not json"),
            DecodedPayload::Literal("not json".to_string())
        );
        assert!(matches!(
            DecodedPayload::parse("{\"delta\":\"x\"}"),
            DecodedPayload::Structured(_)
        ));
    }
}
