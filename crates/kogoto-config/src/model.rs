// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Kogoto relay.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level Kogoto configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KogotoConfig {
    /// HTTP listener and logging.
    #[serde(default)]
    pub server: ServerConfig,

    /// LINE Messaging API channels.
    #[serde(default)]
    pub line: LineConfig,

    /// Dify text-analysis service.
    #[serde(default)]
    pub dify: DifyConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Delivery scheduler settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Intake and preference defaults.
    #[serde(default)]
    pub relay: RelayConfig,

    /// Administrative API settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Prometheus metrics export.
    #[serde(default)]
    pub prometheus: PrometheusConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// LINE Messaging API configuration, one channel per role.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LineConfig {
    /// Base URL of the Messaging API.
    #[serde(default = "default_line_api_base_url")]
    pub api_base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_line_timeout_secs")]
    pub timeout_secs: u64,

    /// Channel the complaining user talks to.
    #[serde(default)]
    pub sender: LineChannelConfig,

    /// Channel the linked recipient talks to.
    #[serde(default)]
    pub recipient: LineChannelConfig,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_line_api_base_url(),
            timeout_secs: default_line_timeout_secs(),
            sender: LineChannelConfig::default(),
            recipient: LineChannelConfig::default(),
        }
    }
}

fn default_line_api_base_url() -> String {
    "https://api.line.me".to_string()
}

fn default_line_timeout_secs() -> u64 {
    30
}

/// Credentials for one LINE channel. `None` leaves the channel unconfigured.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LineChannelConfig {
    #[serde(default)]
    pub channel_access_token: Option<String>,

    #[serde(default)]
    pub channel_secret: Option<String>,
}

impl fmt::Debug for LineChannelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineChannelConfig")
            .field("channel_access_token", &redacted(&self.channel_access_token))
            .field("channel_secret", &redacted(&self.channel_secret))
            .finish()
    }
}

/// Dify chat-messages API configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DifyConfig {
    /// Dify application API key. `None` leaves the provider unconfigured.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL, e.g. `https://api.dify.ai/v1`.
    #[serde(default = "default_dify_api_url")]
    pub api_url: String,

    #[serde(default = "default_dify_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DifyConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_dify_api_url(),
            timeout_secs: default_dify_timeout_secs(),
        }
    }
}

impl fmt::Debug for DifyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DifyConfig")
            .field("api_key", &redacted(&self.api_key))
            .field("api_url", &self.api_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_dify_api_url() -> String {
    "https://api.dify.ai/v1".to_string()
}

fn default_dify_timeout_secs() -> u64 {
    60
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("kogoto").join("kogoto.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("kogoto.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Delivery scheduler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Run the periodic timer. Manual triggers work either way.
    #[serde(default = "default_scheduler_enabled")]
    pub enabled: bool,

    /// Seconds between batch runs.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Maximum complaints fetched per batch run.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// A group is delivered only when now is within this many minutes of the
    /// recipient's configured sending time.
    #[serde(default = "default_window_minutes")]
    pub window_minutes: u32,

    /// Run one batch shortly after startup.
    #[serde(default)]
    pub run_on_startup: bool,

    #[serde(default = "default_startup_delay_secs")]
    pub startup_delay_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: default_scheduler_enabled(),
            interval_secs: default_interval_secs(),
            batch_size: default_batch_size(),
            window_minutes: default_window_minutes(),
            run_on_startup: false,
            startup_delay_secs: default_startup_delay_secs(),
        }
    }
}

fn default_scheduler_enabled() -> bool {
    true
}

fn default_interval_secs() -> u64 {
    600
}

fn default_batch_size() -> usize {
    3
}

fn default_window_minutes() -> u32 {
    30
}

fn default_startup_delay_secs() -> u64 {
    5
}

/// Intake handler and preference-command defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RelayConfig {
    /// Negative complaints scoring strictly above this get a care message.
    #[serde(default = "default_care_score_threshold")]
    pub care_score_threshold: f64,

    /// Skip redelivered webhook events whose event id is already stored.
    #[serde(default = "default_dedupe_redeliveries")]
    pub dedupe_redeliveries: bool,

    /// Frequency used when a recipient sets only the time.
    #[serde(default = "default_sending_frequency")]
    pub default_sending_frequency: u32,

    /// Time used when a recipient sets only the frequency.
    #[serde(default = "default_sending_time")]
    pub default_sending_time: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            care_score_threshold: default_care_score_threshold(),
            dedupe_redeliveries: default_dedupe_redeliveries(),
            default_sending_frequency: default_sending_frequency(),
            default_sending_time: default_sending_time(),
        }
    }
}

fn default_care_score_threshold() -> f64 {
    0.7
}

fn default_dedupe_redeliveries() -> bool {
    true
}

fn default_sending_frequency() -> u32 {
    3
}

fn default_sending_time() -> String {
    "18:00".to_string()
}

/// Administrative API configuration.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Bearer token for `/api/*`. `None` rejects every admin request.
    #[serde(default)]
    pub admin_token: Option<String>,
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("admin_token", &redacted(&self.admin_token))
            .finish()
    }
}

/// Prometheus exporter configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrometheusConfig {
    #[serde(default)]
    pub enabled: bool,
}

fn redacted(value: &Option<String>) -> &'static str {
    match value {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl KogotoConfig {
    /// A copy with every credential replaced by a placeholder, for display.
    pub fn redacted(&self) -> Self {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]".to_string());
        let mut copy = self.clone();
        copy.line.sender.channel_access_token = mask(&self.line.sender.channel_access_token);
        copy.line.sender.channel_secret = mask(&self.line.sender.channel_secret);
        copy.line.recipient.channel_access_token =
            mask(&self.line.recipient.channel_access_token);
        copy.line.recipient.channel_secret = mask(&self.line.recipient.channel_secret);
        copy.dify.api_key = mask(&self.dify.api_key);
        copy.gateway.admin_token = mask(&self.gateway.admin_token);
        copy
    }
}
