//! Integration tests for dvcs-config

use dvcs_config::*;
use std::io::Write;
use tempfile::{Builder, NamedTempFile};

fn write_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_defaults() {
    let settings = Settings::loader().load().unwrap();
    assert_eq!(settings.webhooks.max_payload_size, 1024 * 1024);
}

#[test]
fn test_load_toml_file() {
    let file = write_file(
        ".toml",
        r#"
        [webhooks]
        timeout_secs = 4
        max_backoff_secs = 30
        "#,
    );

    let settings = Settings::loader()
        .file(file.path().to_str().unwrap())
        .load()
        .unwrap();

    assert_eq!(settings.webhooks.timeout_secs, 4);
    assert_eq!(settings.webhooks.max_backoff_secs, 30);
    assert_eq!(settings.webhooks.max_retries, 3);
}

#[test]
fn test_dotenv_overrides_file() {
    let file = write_file(".toml", "[webhooks]\nmax_retries = 2\n");
    let dotenv = write_file(
        ".env",
        "# local overrides\nDVCS_WEBHOOK_MAX_RETRIES=6\nDVCS_REALTIME_BIND_ADDR=\"127.0.0.1:9555\"\n",
    );

    let settings = Settings::loader()
        .file(file.path().to_str().unwrap())
        .dotenv(dotenv.path().to_str().unwrap())
        .load()
        .unwrap();

    assert_eq!(settings.webhooks.max_retries, 6);
    assert_eq!(settings.realtime.bind_addr, "127.0.0.1:9555");
}

#[test]
fn test_invalid_file_rejected() {
    let file = write_file(".toml", "[webhooks]\nmax_retries = 50\n");

    let err = Settings::loader()
        .file(file.path().to_str().unwrap())
        .load()
        .unwrap_err();

    assert!(matches!(err, ConfigError::ValidationError(_)));
}

#[test]
fn test_missing_file() {
    let err = Settings::loader()
        .file("/nonexistent/dvcs.toml")
        .load()
        .unwrap_err();
    assert!(matches!(err, ConfigError::LoadError(_)));
}

#[test]
fn test_config_error_display() {
    let err = ConfigError::InvalidValue {
        key: "DVCS_WEBHOOK_TIMEOUT_SECS".to_string(),
        value: "soon".to_string(),
    };
    let display = format!("{}", err);
    assert!(display.contains("DVCS_WEBHOOK_TIMEOUT_SECS"));
    assert!(display.contains("soon"));
}
