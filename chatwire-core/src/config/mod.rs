//! Configuration module for Chatwire
//!
//! This module provides the configuration schema, loaders and validation for
//! the chat client: where the service lives, how to connect to it, and which
//! request defaults to apply.

mod env;
mod error;
mod schema;
mod validator;

pub use error::{ConfigError, ConfigResult, ValidationError, ValidationErrorKind};
pub use schema::{
    ChatwireConfig, ConnectionConfig, DefaultConfig, EndpointConfig, BASE_URL_ENV,
    CONFIG_VERSION, MODEL_ENV,
};
pub use validator::ConfigValidator;

use std::fs;
use std::path::Path;

/// Load a configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> ConfigResult<ChatwireConfig> {
    let path = path.as_ref();
    let content = read_config(path)?;

    // Interpolate environment variables before parsing
    let interpolated = env::interpolate_env_vars(&content)?;

    let config: ChatwireConfig =
        serde_yaml::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: path.to_string_lossy().to_string(),
            line: e.location().map(|l| l.line()),
            column: e.location().map(|l| l.column()),
            message: e.to_string(),
        })?;

    finish_loading(config)
}

/// Load a configuration from a JSON file
pub fn load_from_json<P: AsRef<Path>>(path: P) -> ConfigResult<ChatwireConfig> {
    let path = path.as_ref();
    let content = read_config(path)?;

    // Interpolate environment variables before parsing
    let interpolated = env::interpolate_env_vars(&content)?;

    let config: ChatwireConfig =
        serde_json::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: path.to_string_lossy().to_string(),
            line: Some(e.line()),
            column: Some(e.column()),
            message: e.to_string(),
        })?;

    finish_loading(config)
}

fn read_config(path: &Path) -> ConfigResult<String> {
    fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_string_lossy().to_string(),
        source: e,
    })
}

fn finish_loading(mut config: ChatwireConfig) -> ConfigResult<ChatwireConfig> {
    env::interpolate_config_env_vars(&mut config)?;
    ConfigValidator::new().validate(&config)?;
    tracing::debug!("Loaded configuration for {}", config.endpoint.base_url);
    Ok(config)
}
