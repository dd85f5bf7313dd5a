// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as valid bind addresses, non-empty paths, and value ranges.

use kogoto_core::SendingTime;

use crate::diagnostic::ConfigError;
use crate::model::KogotoConfig;

/// Largest accepted delivery window: half a day either side.
const MAX_WINDOW_MINUTES: u32 = 720;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &KogotoConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let host = config.server.host.trim();
    if host.is_empty() {
        fail("server.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.scheduler.batch_size == 0 {
        fail("scheduler.batch_size must be at least 1".to_string());
    }

    if config.scheduler.interval_secs == 0 {
        fail("scheduler.interval_secs must be at least 1".to_string());
    }

    if config.scheduler.window_minutes > MAX_WINDOW_MINUTES {
        fail(format!(
            "scheduler.window_minutes must be at most {MAX_WINDOW_MINUTES}, got {}",
            config.scheduler.window_minutes
        ));
    }

    let threshold = config.relay.care_score_threshold;
    if !(0.0..=1.0).contains(&threshold) {
        fail(format!(
            "relay.care_score_threshold must be within [0, 1], got {threshold}"
        ));
    }

    if config.relay.default_sending_frequency == 0 {
        fail("relay.default_sending_frequency must be at least 1".to_string());
    }

    if config
        .relay
        .default_sending_time
        .parse::<SendingTime>()
        .is_err()
    {
        fail(format!(
            "relay.default_sending_time `{}` is not a valid HH:MM time",
            config.relay.default_sending_time
        ));
    }

    if config.dify.api_url.trim().is_empty() {
        fail("dify.api_url must not be empty".to_string());
    }

    if config.line.api_base_url.trim().is_empty() {
        fail("line.api_base_url must not be empty".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
