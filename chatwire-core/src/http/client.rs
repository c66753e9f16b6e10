//! HTTP client implementation using reqwest

use crate::config::{ChatwireConfig, ConfigError, ConnectionConfig};
use crate::error::{ChatError, ChatResult};
use crate::http::{CallOptions, Endpoint, HttpTransport, TransportResponse};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, RequestBuilder};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Default user agent
const USER_AGENT: &str = concat!("chatwire/", env!("CARGO_PKG_VERSION"));

/// Header carrying the request ID
const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Shared HTTP client with connection pooling
#[derive(Clone)]
pub struct HttpClient {
    /// The underlying reqwest client
    client: Arc<Client>,

    /// Base URL the endpoint paths are appended to
    base_url: String,
}

impl HttpClient {
    /// Create a new HTTP client with default connection settings
    pub fn new(base_url: impl Into<String>) -> ChatResult<Self> {
        Self::with_connection(base_url, &ConnectionConfig::default())
    }

    /// Create a client for the endpoint and connection described by `config`
    pub fn from_config(config: &ChatwireConfig) -> ChatResult<Self> {
        Self::with_connection(config.endpoint.base_url.clone(), &config.connection)
    }

    /// Create a new HTTP client with custom connection settings
    pub fn with_connection(
        base_url: impl Into<String>,
        connection: &ConnectionConfig,
    ) -> ChatResult<Self> {
        let mut builder = ClientBuilder::new()
            .pool_max_idle_per_host(connection.max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(connection.connect_timeout())
            .user_agent(USER_AGENT)
            .gzip(true);

        if let Some(timeout) = connection.request_timeout() {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| {
            ChatError::Config(ConfigError::Invalid {
                message: format!("Failed to create HTTP client: {}", e),
            })
        })?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the full URL for an endpoint
    fn build_url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    fn decorate(&self, mut builder: RequestBuilder, options: &CallOptions) -> RequestBuilder {
        builder = builder.header(REQUEST_ID_HEADER, options.request_id.to_string());
        if let Some(accept) = options.accept {
            builder = builder.header(ACCEPT, accept);
        }
        builder
    }

    async fn dispatch(
        &self,
        endpoint: Endpoint,
        builder: RequestBuilder,
        options: &CallOptions,
    ) -> ChatResult<TransportResponse> {
        let request_id = options.request_id;

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                warn!("Request timeout for {} [request_id: {}]", endpoint.path(), request_id);
            } else {
                error!(
                    "Request error for {} [request_id: {}]: {}",
                    endpoint.path(),
                    request_id,
                    e
                );
            }
            ChatError::from(e)
        })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        debug!(
            "Response status: {} content-type: {:?} [request_id: {}]",
            status, content_type, request_id
        );

        let body = response.bytes_stream().map_err(ChatError::from);

        Ok(TransportResponse {
            status,
            content_type,
            body: Some(body.boxed()),
        })
    }
}

#[async_trait]
impl HttpTransport for HttpClient {
    async fn post_json(
        &self,
        endpoint: Endpoint,
        body: &serde_json::Value,
        options: CallOptions,
    ) -> ChatResult<TransportResponse> {
        let url = self.build_url(endpoint);
        debug!("POST {} [request_id: {}]", url, options.request_id);

        let builder = self.decorate(self.client.post(&url).json(body), &options);
        self.dispatch(endpoint, builder, &options).await
    }

    async fn get(&self, endpoint: Endpoint, options: CallOptions) -> ChatResult<TransportResponse> {
        let url = self.build_url(endpoint);
        debug!("GET {} [request_id: {}]", url, options.request_id);

        let builder = self.decorate(self.client.get(&url), &options);
        self.dispatch(endpoint, builder, &options).await
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}
