// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Kogoto configuration system.

use kogoto_config::diagnostic::ConfigError;
use kogoto_config::{load_and_validate_str, load_config_from_str};

/// A full config with every section deserializes.
#[test]
fn full_toml_deserializes_into_kogoto_config() {
    let toml = r#"
[server]
host = "0.0.0.0"
port = 8080
log_level = "debug"

[line]
api_base_url = "http://localhost:9000"
timeout_secs = 5

[line.sender]
channel_access_token = "sender-token"
channel_secret = "sender-secret"

[line.recipient]
channel_access_token = "recipient-token"

[dify]
api_key = "app-123"
api_url = "http://localhost:5001/v1"

[storage]
database_path = "/tmp/kogoto-test.db"
wal_mode = false

[scheduler]
enabled = false
interval_secs = 60
batch_size = 10
window_minutes = 15
run_on_startup = true

[relay]
care_score_threshold = 0.9
dedupe_redeliveries = false
default_sending_frequency = 1
default_sending_time = "07:30"

[gateway]
admin_token = "admin-secret"

[prometheus]
enabled = true
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.line.api_base_url, "http://localhost:9000");
    assert_eq!(
        config.line.sender.channel_access_token.as_deref(),
        Some("sender-token")
    );
    assert!(config.line.recipient.channel_secret.is_none());
    assert_eq!(config.dify.api_key.as_deref(), Some("app-123"));
    assert!(!config.storage.wal_mode);
    assert!(!config.scheduler.enabled);
    assert_eq!(config.scheduler.batch_size, 10);
    assert!(config.scheduler.run_on_startup);
    assert_eq!(config.scheduler.startup_delay_secs, 5);
    assert_eq!(config.relay.care_score_threshold, 0.9);
    assert!(!config.relay.dedupe_redeliveries);
    assert_eq!(config.gateway.admin_token.as_deref(), Some("admin-secret"));
    assert!(config.prometheus.enabled);
}

/// Empty input yields the documented defaults.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_and_validate_str("").expect("defaults are valid");
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.scheduler.interval_secs, 600);
    assert!(config.dify.api_key.is_none());
}

/// Misspelled key yields an UnknownKey diagnostic with a suggestion.
#[test]
fn unknown_key_suggests_correction() {
    let toml = r#"
[scheduler]
bacth_size = 4
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert!(key.ends_with("bacth_size"), "got key {key}");
            assert_eq!(suggestion.as_deref(), Some("batch_size"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// Unknown top-level section is rejected.
#[test]
fn unknown_section_is_rejected() {
    let toml = r#"
[telegram]
bot_token = "x"
"#;
    let err = load_config_from_str(toml).expect_err("unknown section");
    let err_str = err.to_string();
    assert!(
        err_str.contains("unknown field") || err_str.contains("telegram"),
        "got: {err_str}"
    );
}

/// Wrong value type produces an error rather than a silent default.
#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[server]
port = "eighty"
"#;
    let errors = load_and_validate_str(toml).expect_err("port must be an integer");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. } | ConfigError::Other(_))),
        "{errors:?}"
    );
}

/// Semantic validation runs after a successful parse.
#[test]
fn semantic_errors_are_collected() {
    let toml = r#"
[scheduler]
interval_secs = 0

[relay]
default_sending_frequency = 0
"#;
    let errors = load_and_validate_str(toml).expect_err("zero values are invalid");
    assert_eq!(errors.len(), 2);
    assert!(
        errors
            .iter()
            .all(|e| matches!(e, ConfigError::Validation { .. }))
    );
}
