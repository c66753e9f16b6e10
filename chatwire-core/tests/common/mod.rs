//! Scripted in-memory transport shared by the session-level test suites
//!
//! The scripted transport hands out prepared responses in order and records
//! every call, so chunk boundaries and the timing of cancellation are under
//! the test's control.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use chatwire_core::http::{
    ByteStream, CallOptions, Endpoint, HttpTransport, TransportResponse, EVENT_STREAM_MEDIA_TYPE,
};
use chatwire_core::protocol::{
    ChatRequestPayload, ConversationMessage, HistoryPolicy, RequestCodec, RequestOptions,
};
use chatwire_core::{ChatError, ChatResult};
use futures::{stream, StreamExt};
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub struct ScriptedTransport {
    responses: Mutex<VecDeque<TransportResponse>>,
    calls: Mutex<Vec<(Endpoint, Option<Value>, CallOptions)>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<TransportResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(Endpoint, Option<Value>, CallOptions)> {
        self.calls.lock().unwrap().clone()
    }

    fn next_response(&self) -> ChatResult<TransportResponse> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ChatError::Transport("no scripted response left".to_string()))
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn post_json(
        &self,
        endpoint: Endpoint,
        body: &Value,
        options: CallOptions,
    ) -> ChatResult<TransportResponse> {
        self.calls
            .lock()
            .unwrap()
            .push((endpoint, Some(body.clone()), options));
        self.next_response()
    }

    async fn get(&self, endpoint: Endpoint, options: CallOptions) -> ChatResult<TransportResponse> {
        self.calls.lock().unwrap().push((endpoint, None, options));
        self.next_response()
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn chunks(parts: &[&str]) -> ByteStream {
    let owned: Vec<ChatResult<Bytes>> = parts
        .iter()
        .map(|part| Ok(Bytes::from(part.to_string())))
        .collect();
    stream::iter(owned).boxed()
}

/// Body delivered exactly as the given byte slices are cut
pub fn byte_chunks<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> ByteStream {
    let owned: Vec<ChatResult<Bytes>> = parts
        .into_iter()
        .map(|part| Ok(Bytes::copy_from_slice(part)))
        .collect();
    stream::iter(owned).boxed()
}

pub fn event_stream(body: ByteStream) -> TransportResponse {
    TransportResponse {
        status: StatusCode::OK,
        content_type: Some(EVENT_STREAM_MEDIA_TYPE.to_string()),
        body: Some(body),
    }
}

pub fn json_response(status: StatusCode, value: Value) -> TransportResponse {
    TransportResponse {
        status,
        content_type: Some("application/json".to_string()),
        body: Some(chunks(&[value.to_string().as_str()])),
    }
}

pub fn streaming_payload_for(model: &str) -> ChatRequestPayload {
    RequestCodec::new().build(
        &[ConversationMessage::user("hi")],
        &RequestOptions::new(model).with_streaming(true),
        HistoryPolicy::Full,
    )
}

pub fn streaming_payload() -> ChatRequestPayload {
    streaming_payload_for("test-model")
}

pub fn complete_payload() -> ChatRequestPayload {
    RequestCodec::new().build(
        &[ConversationMessage::user("hi")],
        &RequestOptions::new("test-model"),
        HistoryPolicy::Full,
    )
}
