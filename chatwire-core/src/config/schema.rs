//! Configuration schema structures with serde support

use super::error::{ValidationError, ValidationErrorKind};
use crate::protocol::codec::{HistoryPolicy, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use crate::protocol::types::{MAX_TEMPERATURE, MAX_TOKENS_LIMIT, MIN_TEMPERATURE};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable overriding the service base URL
pub const BASE_URL_ENV: &str = "CHATWIRE_BASE_URL";

/// Environment variable overriding the default model
pub const MODEL_ENV: &str = "CHATWIRE_MODEL";

/// Supported schema version
pub const CONFIG_VERSION: &str = "0.1";

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatwireConfig {
    /// Schema version (required - no default)
    pub version: String,

    /// Where the chat service lives
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Connection settings for the HTTP transport
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Request defaults applied by the codec and conversation
    #[serde(default)]
    pub defaults: DefaultConfig,
}

/// Chat service location
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfig {
    /// Base URL the endpoint paths are appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Whole-request timeout in milliseconds. Unset by default so long
    /// streams are not cut off.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,

    /// Maximum idle connections per host
    #[serde(default = "default_max_idle")]
    pub max_idle_per_host: usize,

    /// Largest complete (non-streaming) body accepted
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout(),
            request_timeout_ms: None,
            max_idle_per_host: default_max_idle(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

impl ConnectionConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

/// Default configuration values
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultConfig {
    /// Model requested by `Conversation::send_with_defaults` and by sends
    /// whose options leave the model empty
    #[serde(default = "default_model")]
    pub model: String,

    /// Default max tokens for responses
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Whether requests ask for an event stream by default
    #[serde(default)]
    pub stream: bool,

    /// Which part of the conversation is sent
    #[serde(default)]
    pub history: HistoryPolicy,
}

impl Default for DefaultConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            stream: false,
            history: HistoryPolicy::default(),
        }
    }
}

// Default value functions for serde
fn default_base_url() -> String { "http://localhost:8080/api/v1".to_string() }
fn default_connect_timeout() -> u64 { 10000 }
fn default_max_idle() -> usize { 10 }
fn default_max_response_bytes() -> usize { 10 * 1024 * 1024 }
fn default_model() -> String { "gpt-3.5-turbo".to_string() }
fn default_max_tokens() -> u32 { DEFAULT_MAX_TOKENS }
fn default_temperature() -> f32 { DEFAULT_TEMPERATURE }

impl Default for ChatwireConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            endpoint: EndpointConfig::default(),
            connection: ConnectionConfig::default(),
            defaults: DefaultConfig::default(),
        }
    }
}

impl ChatwireConfig {
    /// Defaults with `CHATWIRE_BASE_URL` and `CHATWIRE_MODEL` applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            if !base_url.trim().is_empty() {
                config.endpoint.base_url = base_url;
            }
        }
        if let Ok(model) = std::env::var(MODEL_ENV) {
            if !model.trim().is_empty() {
                config.defaults.model = model;
            }
        }
        config
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version.is_empty() {
            return Err(ValidationError::required("version"));
        }

        if self.version != CONFIG_VERSION {
            return Err(ValidationError::new(
                "version",
                ValidationErrorKind::InvalidVersion {
                    expected: CONFIG_VERSION.to_string(),
                    actual: self.version.clone(),
                },
            ));
        }

        if self.endpoint.base_url.is_empty() {
            return Err(ValidationError::required("endpoint.base_url"));
        }

        self.connection.validate("connection")?;
        self.defaults.validate("defaults")?;

        Ok(())
    }
}

impl ConnectionConfig {
    /// Validate connection settings
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.connect_timeout_ms == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.connect_timeout_ms", path),
                "Must be greater than 0",
            ));
        }

        if self.request_timeout_ms == Some(0) {
            return Err(ValidationError::out_of_range(
                format!("{}.request_timeout_ms", path),
                "Must be greater than 0 when set",
            ));
        }

        if self.max_response_bytes == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.max_response_bytes", path),
                "Must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl DefaultConfig {
    /// Validate request defaults
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.model.is_empty() {
            return Err(ValidationError::required(format!("{}.model", path)));
        }

        if !(1..=MAX_TOKENS_LIMIT).contains(&self.max_tokens) {
            return Err(ValidationError::out_of_range(
                format!("{}.max_tokens", path),
                format!("Must be between 1 and {}", MAX_TOKENS_LIMIT),
            ));
        }

        if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&self.temperature) {
            return Err(ValidationError::out_of_range(
                format!("{}.temperature", path),
                "Must be between 0.0 and 2.0",
            ));
        }

        Ok(())
    }
}
