//! Environment variable interpolation for configuration

use super::error::ConfigError;
use regex::Regex;
use std::env;
use std::sync::OnceLock;

/// Pattern for `${VAR}` placeholders
pub(crate) fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("placeholder pattern is valid")
    })
}

/// Interpolate environment variables in a configuration string
pub fn interpolate_env_vars(content: &str) -> Result<String, ConfigError> {
    let mut result = content.to_string();
    let mut missing_vars = Vec::new();

    for cap in env_var_pattern().captures_iter(content) {
        let full_match = &cap[0];
        let var_name = &cap[1];

        match env::var(var_name) {
            Ok(value) => {
                result = result.replace(full_match, &value);
            }
            Err(_) => {
                missing_vars.push(var_name.to_string());
            }
        }
    }

    // Report the first missing variable
    if let Some(var) = missing_vars.into_iter().next() {
        return Err(ConfigError::EnvVarNotFound { var });
    }

    Ok(result)
}

/// Interpolate the fields that may still hold placeholders after parsing
pub fn interpolate_config_env_vars(
    config: &mut super::schema::ChatwireConfig,
) -> Result<(), ConfigError> {
    if env_var_pattern().is_match(&config.endpoint.base_url) {
        config.endpoint.base_url = interpolate_env_vars(&config.endpoint.base_url)?;
    }
    if env_var_pattern().is_match(&config.defaults.model) {
        config.defaults.model = interpolate_env_vars(&config.defaults.model)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_env_vars() {
        env::set_var("CHATWIRE_TEST_VAR", "test_value");

        let content = "base_url: ${CHATWIRE_TEST_VAR}";
        let result = interpolate_env_vars(content).unwrap();
        assert_eq!(result, "base_url: test_value");

        env::remove_var("CHATWIRE_TEST_VAR");
    }

    #[test]
    fn test_missing_env_var() {
        let content = "base_url: ${CHATWIRE_MISSING_VAR}";
        let result = interpolate_env_vars(content);

        match result {
            Err(ConfigError::EnvVarNotFound { var }) => assert_eq!(var, "CHATWIRE_MISSING_VAR"),
            other => panic!("Expected EnvVarNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_multiple_env_vars() {
        env::set_var("CHATWIRE_VAR1", "value1");
        env::set_var("CHATWIRE_VAR2", "value2");

        let content = "key1: ${CHATWIRE_VAR1}, key2: ${CHATWIRE_VAR2}";
        let result = interpolate_env_vars(content).unwrap();
        assert_eq!(result, "key1: value1, key2: value2");

        env::remove_var("CHATWIRE_VAR1");
        env::remove_var("CHATWIRE_VAR2");
    }
}
