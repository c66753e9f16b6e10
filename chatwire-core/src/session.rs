//! Request/response cycle driver
//!
//! A [`TransportSession`] performs one outbound call per [`send`], classifies
//! the response by its declared content type, and either reads one complete
//! JSON body or consumes an event stream frame by frame. It owns the
//! cancellation token of the attempt in flight; starting a new attempt
//! cancels and replaces the previous one before any network call is made.
//! Only the attempt that currently owns the session publishes its
//! [`AttemptState`], so a superseded attempt never overwrites a newer one.
//!
//! The only suspension points are the outbound request and the body reads.
//! Splitting, decoding and sink calls for a chunk run synchronously and in
//! order, so increments reach the sink in frame-arrival order.
//!
//! [`send`]: TransportSession::send

use crate::config::ChatwireConfig;
use crate::error::{ChatError, ChatResult};
use crate::http::error::map_http_error;
use crate::http::{ByteStream, CallOptions, Endpoint, HttpClient, HttpTransport, TransportResponse};
use crate::protocol::types::{ChatRequestPayload, FinishReason, ResponseRecord};
use crate::stream::{decode_frame, AttemptState, FrameOutcome, FrameSplitter, ResponseAccumulator};
use futures::StreamExt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default cap on complete bodies and on a single unterminated frame
const DEFAULT_MAX_RESPONSE_BYTES: usize = 10 * 1024 * 1024;

/// Single-flight chat session over an [`HttpTransport`]
pub struct TransportSession {
    transport: Arc<dyn HttpTransport>,

    /// Most recent attempt. Replaced wholesale on every send.
    current: Mutex<Option<AttemptSlot>>,

    max_response_bytes: usize,
}

/// Identity, token and published state of one attempt
#[derive(Debug)]
struct AttemptSlot {
    request_id: Uuid,
    token: CancellationToken,
    state: AttemptState,
}

impl TransportSession {
    /// Create a session over any transport
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            current: Mutex::new(None),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }

    /// Create a session backed by the reqwest transport described by `config`
    pub fn from_config(config: &ChatwireConfig) -> ChatResult<Self> {
        let client = HttpClient::from_config(config)?;
        Ok(Self::new(Arc::new(client))
            .with_max_response_bytes(config.connection.max_response_bytes))
    }

    /// Cap the size of complete bodies and of any single streamed frame
    pub fn with_max_response_bytes(mut self, limit: usize) -> Self {
        self.max_response_bytes = limit;
        self
    }

    /// Cancel the attempt in flight, if any.
    ///
    /// Cancellation is observed at the next suspension point or before the
    /// next frame is decoded, whichever comes first.
    pub fn cancel(&self) {
        if let Some(slot) = self.lock_current().as_ref() {
            slot.token.cancel();
        }
    }

    /// State of the most recent attempt, `Idle` before the first send
    pub fn last_state(&self) -> AttemptState {
        self.lock_current()
            .as_ref()
            .map(|slot| slot.state.clone())
            .unwrap_or_default()
    }

    /// Send a payload and forward every text increment to `sink`.
    ///
    /// Streaming responses call `sink` once per non-empty increment; complete
    /// JSON responses call it exactly once with the whole message. Increments
    /// already delivered stay delivered when the attempt later fails or is
    /// cancelled.
    pub async fn send<S>(&self, payload: &ChatRequestPayload, mut sink: S) -> ChatResult<ResponseRecord>
    where
        S: FnMut(&str) + Send,
    {
        let request_id = Uuid::new_v4();
        let token = self.supersede(request_id);
        let mut state = AttemptState::Idle;
        self.transition(request_id, &mut state, AttemptState::Sending);

        info!(
            "Sending chat request model={} messages={} stream={} [request_id: {}]",
            payload.model(),
            payload.messages.len(),
            payload.is_streaming(),
            request_id
        );

        let result = self
            .attempt(payload, &token, request_id, &mut state, &mut sink)
            .await;

        let terminal = match &result {
            Ok(record) => {
                AttemptState::Completed(record.finish_reason.clone().unwrap_or(FinishReason::Stop))
            }
            Err(ChatError::Cancelled) => AttemptState::Cancelled,
            Err(_) => AttemptState::Failed,
        };
        self.transition(request_id, &mut state, terminal);

        match &result {
            Ok(record) => info!(
                "Chat request {} with {} chars from {} [request_id: {}]",
                state,
                record.message.len(),
                record.model,
                request_id
            ),
            Err(ChatError::Cancelled) => debug!("Chat request cancelled [request_id: {}]", request_id),
            Err(e) => warn!("Chat request failed: {} [request_id: {}]", e, request_id),
        }

        result
    }

    /// List the model identifiers the service offers
    pub async fn list_models(&self) -> ChatResult<Vec<String>> {
        self.fetch_names(Endpoint::Models).await
    }

    /// List the provider names the service offers
    pub async fn list_providers(&self) -> ChatResult<Vec<String>> {
        self.fetch_names(Endpoint::Providers).await
    }

    /// Atomically cancel the previous token and install a fresh one
    fn supersede(&self, request_id: Uuid) -> CancellationToken {
        let fresh = CancellationToken::new();
        let previous = self.lock_current().replace(AttemptSlot {
            request_id,
            token: fresh.clone(),
            state: AttemptState::Idle,
        });
        if let Some(previous) = previous {
            if !previous.token.is_cancelled() {
                debug!(
                    "Superseding in-flight chat request [request_id: {}]",
                    previous.request_id
                );
            }
            previous.token.cancel();
        }
        fresh
    }

    /// Advance the attempt's own state and publish it while it owns the session
    fn transition(&self, request_id: Uuid, state: &mut AttemptState, next: AttemptState) {
        state.advance(next);
        if let Some(slot) = self.lock_current().as_mut() {
            if slot.request_id == request_id {
                slot.state = state.clone();
            }
        }
    }

    fn lock_current(&self) -> MutexGuard<'_, Option<AttemptSlot>> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn attempt<S>(
        &self,
        payload: &ChatRequestPayload,
        token: &CancellationToken,
        request_id: Uuid,
        state: &mut AttemptState,
        sink: &mut S,
    ) -> ChatResult<ResponseRecord>
    where
        S: FnMut(&str) + Send,
    {
        let body = serde_json::to_value(payload)?;
        let mut options = CallOptions {
            request_id,
            accept: None,
        };
        if payload.is_streaming() {
            options = options.accept_event_stream();
        }

        let response = cancellable(token, self.transport.post_json(Endpoint::Chat, &body, options)).await?;

        if !response.status.is_success() {
            return Err(self.read_failure(response, token, request_id).await);
        }

        if !response.is_event_stream() {
            return self
                .read_complete(response, payload.model(), token, request_id, sink)
                .await;
        }

        let Some(stream) = response.body else {
            return Err(ChatError::StreamUnsupported);
        };

        self.transition(request_id, state, AttemptState::StreamingFrames);
        consume_stream(
            stream,
            payload.model(),
            self.max_response_bytes,
            token,
            request_id,
            sink,
        )
        .await
    }

    async fn read_failure(
        &self,
        response: TransportResponse,
        token: &CancellationToken,
        request_id: Uuid,
    ) -> ChatError {
        let status = response.status;
        let body = match cancellable(token, response.collect_body(self.max_response_bytes)).await {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(ChatError::Cancelled) => return ChatError::Cancelled,
            Err(e) => {
                debug!("Could not read error body: {} [request_id: {}]", e, request_id);
                None
            }
        };
        map_http_error(status, body.as_deref(), request_id)
    }

    async fn read_complete<S>(
        &self,
        response: TransportResponse,
        requested_model: &str,
        token: &CancellationToken,
        request_id: Uuid,
        sink: &mut S,
    ) -> ChatResult<ResponseRecord>
    where
        S: FnMut(&str) + Send,
    {
        debug!(
            "Response is not an event stream ({:?}), reading complete body [request_id: {}]",
            response.content_type, request_id
        );

        let bytes = cancellable(token, response.collect_body(self.max_response_bytes)).await?;
        let mut record: ResponseRecord = serde_json::from_slice(&bytes).map_err(|e| {
            ChatError::InvalidResponse(format!(
                "Invalid response format: {} [request_id: {}]",
                e, request_id
            ))
        })?;
        if record.model.is_empty() {
            record.model = requested_model.to_string();
        }

        if token.is_cancelled() {
            return Err(ChatError::Cancelled);
        }
        sink(&record.message);
        Ok(record)
    }

    async fn fetch_names(&self, endpoint: Endpoint) -> ChatResult<Vec<String>> {
        let options = CallOptions::new();
        let request_id = options.request_id;

        let response = self.transport.get(endpoint, options).await?;
        let status = response.status;
        let bytes = response.collect_body(self.max_response_bytes).await?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes);
            return Err(map_http_error(status, Some(&body), request_id));
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            ChatError::InvalidResponse(format!(
                "Invalid {} listing: {} [request_id: {}]",
                endpoint.path(),
                e,
                request_id
            ))
        })
    }
}

impl std::fmt::Debug for TransportSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportSession")
            .field("max_response_bytes", &self.max_response_bytes)
            .finish_non_exhaustive()
    }
}

/// Race a transport future against the attempt's token
async fn cancellable<T, F>(token: &CancellationToken, future: F) -> ChatResult<T>
where
    F: Future<Output = ChatResult<T>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ChatError::Cancelled),
        result = future => result,
    }
}

async fn consume_stream<S>(
    mut stream: ByteStream,
    requested_model: &str,
    max_frame_bytes: usize,
    token: &CancellationToken,
    request_id: Uuid,
    sink: &mut S,
) -> ChatResult<ResponseRecord>
where
    S: FnMut(&str) + Send,
{
    let mut splitter = FrameSplitter::new();
    let mut accumulator = ResponseAccumulator::new(requested_model);

    loop {
        let next = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(ChatError::Cancelled),
            next = stream.next() => next,
        };

        let Some(chunk) = next else {
            break;
        };
        let chunk = chunk?;

        for frame in splitter.push(&chunk) {
            if token.is_cancelled() {
                return Err(ChatError::Cancelled);
            }

            match decode_frame(&frame) {
                FrameOutcome::Done => {
                    debug!(
                        "Stream completed after {} increments [request_id: {}]",
                        accumulator.increments(),
                        request_id
                    );
                    return Ok(accumulator.finish(FinishReason::Stop));
                }
                FrameOutcome::Increment(increment) => {
                    accumulator.apply(&increment);
                    if increment.has_text() {
                        sink(&increment.text);
                    }
                }
                FrameOutcome::Ignored => {}
            }
        }

        if splitter.buffered() > max_frame_bytes {
            return Err(ChatError::InvalidResponse(format!(
                "Unterminated frame exceeds {} bytes [request_id: {}]",
                max_frame_bytes, request_id
            )));
        }
    }

    let discarded = splitter.finish();
    if discarded > 0 {
        debug!(
            "Discarded {} bytes of unterminated trailing frame [request_id: {}]",
            discarded, request_id
        );
    }
    debug!(
        "Stream ended without sentinel after {} increments [request_id: {}]",
        accumulator.increments(),
        request_id
    );
    Ok(accumulator.finish(FinishReason::Eof))
}
