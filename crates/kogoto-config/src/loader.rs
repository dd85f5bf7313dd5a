// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./kogoto.toml` > `~/.config/kogoto/kogoto.toml` > `/etc/kogoto/kogoto.toml`
//! with environment variable overrides via `KOGOTO_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::KogotoConfig;

pub(crate) const SYSTEM_CONFIG_PATH: &str = "/etc/kogoto/kogoto.toml";
pub(crate) const LOCAL_CONFIG_PATH: &str = "kogoto.toml";

/// Env var sections, longest first so `line_sender_*` wins over `line_*`.
const ENV_SECTIONS: &[&str] = &[
    "line_recipient",
    "line_sender",
    "prometheus",
    "scheduler",
    "gateway",
    "storage",
    "server",
    "relay",
    "dify",
    "line",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/kogoto/kogoto.toml` (system-wide)
/// 3. `~/.config/kogoto/kogoto.toml` (user XDG config)
/// 4. `./kogoto.toml` (local directory)
/// 5. `KOGOTO_*` environment variables
pub fn load_config() -> Result<KogotoConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<KogotoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KogotoConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<KogotoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KogotoConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for the standard lookup, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(KogotoConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

pub(crate) fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("kogoto/kogoto.toml"))
}

/// Environment provider mapping `KOGOTO_<SECTION>_<KEY>` to `section.key`.
///
/// Uses an explicit section table instead of `Env::split("_")` because key
/// names contain underscores: `KOGOTO_LINE_SENDER_CHANNEL_ACCESS_TOKEN` must
/// become `line.sender.channel_access_token`.
fn env_provider() -> Env {
    Env::prefixed("KOGOTO_").map(|key| map_env_key(key.as_str()).into())
}

/// Figment hands over the key as written in the environment (`DIFY_API_KEY`).
fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{}.{rest}", section.replace('_', "."));
        }
    }
    key
}
