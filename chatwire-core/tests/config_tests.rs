//! Integration tests for configuration loading and validation

use chatwire_core::config::{
    load_from_json, load_from_yaml, ChatwireConfig, ConfigError, ValidationErrorKind,
};
use chatwire_core::protocol::HistoryPolicy;
use chatwire_core::TransportSession;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to create a test config file
fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_valid_yaml_config() {
    use std::env;
    env::set_var("CHATWIRE_TEST_YAML_HOST", "chat.internal:9000");

    let yaml = r#"
version: "0.1"
endpoint:
  base_url: http://${CHATWIRE_TEST_YAML_HOST}/api/v1
connection:
  connect_timeout_ms: 2500
  request_timeout_ms: 60000
defaults:
  model: gpt-4
  max_tokens: 512
  temperature: 0.2
  stream: true
  history: latest_user_message
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yaml", yaml);

    let config = load_from_yaml(path).unwrap();
    assert_eq!(config.version, "0.1");
    assert_eq!(config.endpoint.base_url, "http://chat.internal:9000/api/v1");
    assert_eq!(config.connection.connect_timeout_ms, 2500);
    assert_eq!(config.connection.request_timeout_ms, Some(60000));
    assert_eq!(config.connection.max_idle_per_host, 10);
    assert_eq!(config.defaults.model, "gpt-4");
    assert_eq!(config.defaults.max_tokens, 512);
    assert!(config.defaults.stream);
    assert_eq!(config.defaults.history, HistoryPolicy::LatestUserMessage);

    env::remove_var("CHATWIRE_TEST_YAML_HOST");
}

#[test]
fn test_load_valid_json_config() {
    let json = r#"{
        "version": "0.1",
        "endpoint": { "base_url": "https://chat.example.com/api/v1/" },
        "defaults": { "model": "llama3" }
    }"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.json", json);

    let config = load_from_json(path).unwrap();
    assert_eq!(config.endpoint.base_url, "https://chat.example.com/api/v1/");
    assert_eq!(config.defaults.model, "llama3");
    assert_eq!(config.defaults.max_tokens, 150);
    assert_eq!(config.defaults.history, HistoryPolicy::Full);
    assert!(!config.defaults.stream);
}

#[test]
fn test_minimal_config_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "minimal.yaml", "version: \"0.1\"\n");

    let config = load_from_yaml(path).unwrap();
    let defaults = ChatwireConfig::default();
    assert_eq!(config.endpoint.base_url, defaults.endpoint.base_url);
    assert_eq!(config.defaults.model, "gpt-3.5-turbo");
    assert_eq!(config.connection.request_timeout_ms, None);
}

#[test]
fn test_missing_env_var() {
    let yaml = r#"
version: "0.1"
endpoint:
  base_url: ${CHATWIRE_TEST_NONEXISTENT_URL}
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yaml", yaml);

    match load_from_yaml(path) {
        Err(ConfigError::EnvVarNotFound { var }) => {
            assert_eq!(var, "CHATWIRE_TEST_NONEXISTENT_URL");
        }
        other => panic!("Expected EnvVarNotFound error, got {:?}", other),
    }
}

#[test]
fn test_invalid_yaml_syntax() {
    let yaml = r#"
version: "0.1"
endpoint:
  base_url: [unclosed
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yaml", yaml);

    match load_from_yaml(path) {
        Err(ConfigError::ParseError { line, .. }) => assert!(line.is_some()),
        other => panic!("Expected ParseError, got {:?}", other),
    }
}

#[test]
fn test_metadata_section_rejected() {
    let yaml = "version: \"0.1\"\nmetadata:\n  team: support\n";

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yaml", yaml);

    assert!(matches!(load_from_yaml(path), Err(ConfigError::ParseError { .. })));
}

#[test]
fn test_unknown_field_rejected() {
    let json = r#"{ "version": "0.1", "retries": 3 }"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.json", json);

    assert!(matches!(load_from_json(path), Err(ConfigError::ParseError { .. })));
}

#[test]
fn test_wrong_version_rejected() {
    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yaml", "version: \"2.0\"\n");

    match load_from_yaml(path) {
        Err(ConfigError::ValidationError(err)) => {
            assert_eq!(err.field_path, "version");
            assert!(matches!(err.kind, ValidationErrorKind::InvalidVersion { .. }));
        }
        other => panic!("Expected ValidationError, got {:?}", other),
    }
}

#[test]
fn test_unsupported_url_scheme_rejected() {
    let yaml = r#"
version: "0.1"
endpoint:
  base_url: ftp://chat.example.com
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.yaml", yaml);

    match load_from_yaml(path) {
        Err(ConfigError::ValidationError(err)) => {
            assert_eq!(err.field_path, "endpoint.base_url");
            assert!(matches!(err.kind, ValidationErrorKind::InvalidUrl { .. }));
        }
        other => panic!("Expected ValidationError, got {:?}", other),
    }
}

#[test]
fn test_out_of_range_defaults_rejected() {
    let json = r#"{ "version": "0.1", "defaults": { "temperature": 3.5 } }"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "config.json", json);

    match load_from_json(path) {
        Err(ConfigError::ValidationError(err)) => {
            assert_eq!(err.field_path, "defaults.temperature");
            assert!(matches!(err.kind, ValidationErrorKind::OutOfRange { .. }));
        }
        other => panic!("Expected ValidationError, got {:?}", other),
    }
}

#[test]
fn test_missing_file() {
    match load_from_yaml("/nonexistent/chatwire.yaml") {
        Err(ConfigError::IoError { path, .. }) => assert!(path.contains("chatwire.yaml")),
        other => panic!("Expected IoError, got {:?}", other),
    }
}

#[test]
fn test_session_from_loaded_config() {
    let dir = TempDir::new().unwrap();
    let path = create_test_file(
        &dir,
        "config.yaml",
        "version: \"0.1\"\nconnection:\n  max_response_bytes: 4096\n",
    );

    let config = load_from_yaml(path).unwrap();
    let session = TransportSession::from_config(&config).unwrap();
    assert!(format!("{:?}", session).contains("4096"));
}
