//! Configuration validation utilities

use super::env::env_var_pattern;
use super::error::ValidationError;
use super::schema::ChatwireConfig;
use crate::protocol::types::{RequestOptions, MAX_TEMPERATURE, MAX_TOKENS_LIMIT, MIN_TEMPERATURE};

/// Configuration validator with rules beyond the schema's own checks
#[derive(Debug, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self
    }

    /// Validate a configuration with extended rules
    pub fn validate(&self, config: &ChatwireConfig) -> Result<(), ValidationError> {
        config.validate()?;
        self.validate_base_url(&config.endpoint.base_url)?;
        Ok(())
    }

    /// Validate caller-supplied request options against the service's bounds
    pub fn validate_options(&self, options: &RequestOptions) -> Result<(), ValidationError> {
        if options.model.is_empty() {
            return Err(ValidationError::required("model"));
        }

        if let Some(max_tokens) = options.max_tokens {
            if !(1..=MAX_TOKENS_LIMIT).contains(&max_tokens) {
                return Err(ValidationError::out_of_range(
                    "max_tokens",
                    format!("Must be between 1 and {}", MAX_TOKENS_LIMIT),
                ));
            }
        }

        if let Some(temperature) = options.temperature {
            if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&temperature) {
                return Err(ValidationError::out_of_range(
                    "temperature",
                    "Must be between 0.0 and 2.0",
                ));
            }
        }

        Ok(())
    }

    fn validate_base_url(&self, base_url: &str) -> Result<(), ValidationError> {
        if env_var_pattern().is_match(base_url) {
            return Err(ValidationError::invalid_url(
                "endpoint.base_url",
                "unresolved environment placeholder",
            ));
        }

        match url::Url::parse(base_url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(()),
            Ok(url) => Err(ValidationError::invalid_url(
                "endpoint.base_url",
                format!("URL scheme must be http or https, got: {}", url.scheme()),
            )),
            Err(e) => Err(ValidationError::invalid_url("endpoint.base_url", e.to_string())
                .with_context(base_url)),
        }
    }

    /// Extract environment variables from a string
    pub fn extract_env_vars(&self, text: &str) -> Vec<String> {
        env_var_pattern()
            .captures_iter(text)
            .map(|cap| cap[1].to_string())
            .collect()
    }
}
