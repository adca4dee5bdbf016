use serial_test::serial;
use std::env;
use std::fs::write;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::NamedTempFile;

use drive_optima::config::{AppConfig, DEFAULT_MODEL};
use drive_optima::error::ConfigError;

const ENV_KEYS: [&str; 6] = [
    "GEMINI_CONFIG",
    "API_KEY",
    "GEMINI_MODEL",
    "GEMINI_BASE_URL",
    "DRIVE_OPTIMA_STORAGE_DIR",
    "DRIVE_OPTIMA_APPLY_DELAY_MS",
];

fn clear_env() {
    for key in ENV_KEYS {
        env::remove_var(key);
    }
}

/// A static config file plus the environment yields the merged settings.
#[test]
#[serial]
fn test_load_config_merges_file_and_env() {
    clear_env();
    let config_yaml = r#"
classifier:
  model: gemini-test
  base_url: http://localhost:8080
  timeout_secs: 5
storage_dir: ./tmp/session
apply_delay_ms: 250
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    env::set_var("API_KEY", "top-secret-test-key");
    env::set_var("GEMINI_MODEL", "gemini-from-env");

    let config = AppConfig::load(config_file.path()).expect("Config should load");

    assert_eq!(config.classifier.api_key.as_deref(), Some("top-secret-test-key"));
    // Environment overrides the file.
    assert_eq!(config.classifier.model, "gemini-from-env");
    assert_eq!(config.classifier.base_url, "http://localhost:8080");
    assert_eq!(config.classifier.timeout, Duration::from_secs(5));
    assert_eq!(config.storage_dir, Some(PathBuf::from("./tmp/session")));
    assert_eq!(config.apply_delay, Duration::from_millis(250));

    clear_env();
}

/// A missing key is not a load failure; only analysis needs it.
#[test]
#[serial]
fn test_missing_key_still_loads() {
    clear_env();
    let config = AppConfig::from_env().expect("Config should load without a key");
    assert!(config.classifier.api_key.is_none());
    assert_eq!(config.classifier.model, DEFAULT_MODEL);
}

#[test]
#[serial]
fn test_blank_key_counts_as_missing() {
    clear_env();
    env::set_var("API_KEY", "   ");
    let config = AppConfig::from_env().unwrap();
    assert!(config.classifier.api_key.is_none());
    clear_env();
}

#[test]
#[serial]
fn test_gemini_config_wins_over_api_key() {
    clear_env();
    env::set_var("API_KEY", "plain-key");
    env::set_var("GEMINI_CONFIG", "preferred-key");
    let config = AppConfig::from_env().unwrap();
    assert_eq!(config.classifier.api_key.as_deref(), Some("preferred-key"));

    env::set_var("GEMINI_CONFIG", "");
    let config = AppConfig::from_env().unwrap();
    assert_eq!(config.classifier.api_key.as_deref(), Some("plain-key"));
    clear_env();
}

#[test]
#[serial]
fn test_load_config_errors_for_invalid_file() {
    clear_env();
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), b"not-yaml: [:::").unwrap();

    let err = AppConfig::load(config_file.path()).unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

#[test]
#[serial]
fn test_load_config_rejects_secrets_in_file() {
    clear_env();
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), "api_key: oops\n").unwrap();
    assert!(matches!(
        AppConfig::load(config_file.path()),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
#[serial]
fn test_missing_file_is_a_read_error() {
    clear_env();
    assert!(matches!(
        AppConfig::load("/definitely/not/here.yaml"),
        Err(ConfigError::Read { .. })
    ));
}

#[test]
#[serial]
fn test_bad_apply_delay_is_rejected() {
    clear_env();
    env::set_var("DRIVE_OPTIMA_APPLY_DELAY_MS", "soon");
    let err = AppConfig::from_env().unwrap_err();
    assert!(err.to_string().contains("DRIVE_OPTIMA_APPLY_DELAY_MS"));
    clear_env();
}
