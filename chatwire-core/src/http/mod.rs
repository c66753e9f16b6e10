//! HTTP transport layer for the chat service
//!
//! This module implements the network boundary, handling:
//! - Endpoint paths relative to the configured base URL
//! - The transport seam (`HttpTransport`) the session drives
//! - Exposing response bodies as byte streams
//! - Error body mapping and request ID correlation

pub mod client;
pub mod error;

use crate::error::{ChatError, ChatResult};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::StatusCode;
use uuid::Uuid;

pub use client::HttpClient;

/// Media type advertised and recognized for event streams
pub const EVENT_STREAM_MEDIA_TYPE: &str = "text/event-stream";

/// Raw response body, delivered at the transport's own chunk granularity
pub type ByteStream = BoxStream<'static, ChatResult<Bytes>>;

/// Endpoints of the chat service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Chat completion
    Chat,
    /// Available model identifiers
    Models,
    /// Available provider names
    Providers,
}

impl Endpoint {
    /// Get the path for this endpoint
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Chat => "/chat",
            Endpoint::Models => "/models",
            Endpoint::Providers => "/providers",
        }
    }
}

/// Per-call options for the transport
#[derive(Debug, Clone)]
pub struct CallOptions {
    /// Unique request ID for correlation
    pub request_id: Uuid,

    /// Value of the `Accept` header, if one should be sent
    pub accept: Option<&'static str>,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            accept: None,
        }
    }
}

impl CallOptions {
    /// Create call options with a fresh request ID
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertise acceptance of an event stream
    pub fn accept_event_stream(mut self) -> Self {
        self.accept = Some(EVENT_STREAM_MEDIA_TYPE);
        self
    }
}

/// Status, declared content type and body of a response
pub struct TransportResponse {
    /// HTTP status
    pub status: StatusCode,

    /// Declared `Content-Type`, if any
    pub content_type: Option<String>,

    /// Incremental body reader. `None` when the transport cannot read the
    /// body incrementally.
    pub body: Option<ByteStream>,
}

impl TransportResponse {
    /// Whether the declared content type is an event stream
    pub fn is_event_stream(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().contains(EVENT_STREAM_MEDIA_TYPE))
            .unwrap_or(false)
    }

    /// Read the whole body, refusing anything larger than `limit` bytes
    pub async fn collect_body(self, limit: usize) -> ChatResult<Bytes> {
        let Some(mut body) = self.body else {
            return Ok(Bytes::new());
        };

        let mut collected = Vec::new();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            if collected.len() + chunk.len() > limit {
                return Err(ChatError::InvalidResponse(format!(
                    "Response size exceeds maximum {}",
                    limit
                )));
            }
            collected.extend_from_slice(&chunk);
        }
        Ok(Bytes::from(collected))
    }
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .field("body", &self.body.as_ref().map(|_| "<stream>"))
            .finish()
    }
}

/// Trait for HTTP transports
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// POST a JSON body to an endpoint
    async fn post_json(
        &self,
        endpoint: Endpoint,
        body: &serde_json::Value,
        options: CallOptions,
    ) -> ChatResult<TransportResponse>;

    /// GET an endpoint
    async fn get(&self, endpoint: Endpoint, options: CallOptions) -> ChatResult<TransportResponse>;
}
