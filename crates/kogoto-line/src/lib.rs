// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LINE Messaging API channel adapter for Kogoto.
//!
//! One [`LineChannel`] exists per configured LINE channel (sender side and
//! recipient side). It implements [`TransportAdapter`] for replies and pushes;
//! webhook decoding lives in [`webhook`].

pub mod client;
pub mod webhook;

use std::time::Duration;

use async_trait::async_trait;
use kogoto_config::model::{LineChannelConfig, LineConfig};
use kogoto_core::{AdapterType, HealthStatus, KogotoError, PluginAdapter, TransportAdapter};
use tracing::{debug, info};

pub use client::{BotInfo, LineClient};
pub use webhook::WebhookBody;

/// Which side of the relay a channel serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRole {
    Sender,
    Recipient,
}

impl ChannelRole {
    fn adapter_name(self) -> &'static str {
        match self {
            ChannelRole::Sender => "line-sender",
            ChannelRole::Recipient => "line-recipient",
        }
    }
}

/// A single LINE channel.
pub struct LineChannel {
    role: ChannelRole,
    client: LineClient,
}

impl LineChannel {
    /// Builds the adapter for `role` from its channel credentials.
    ///
    /// Fails when the channel access token is missing or blank.
    pub fn new(
        role: ChannelRole,
        channel: &LineChannelConfig,
        line: &LineConfig,
    ) -> Result<Self, KogotoError> {
        let token = channel
            .channel_access_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                KogotoError::Config(format!(
                    "LINE channel access token is required for {}",
                    role.adapter_name()
                ))
            })?;

        let client = LineClient::new(
            token,
            &line.api_base_url,
            Duration::from_secs(line.timeout_secs),
        )?;
        info!(channel = role.adapter_name(), "LINE channel configured");
        Ok(Self { role, client })
    }

    pub fn role(&self) -> ChannelRole {
        self.role
    }

    pub fn client(&self) -> &LineClient {
        &self.client
    }
}

#[async_trait]
impl PluginAdapter for LineChannel {
    fn name(&self) -> &str {
        self.role.adapter_name()
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, KogotoError> {
        match self.client.bot_info().await {
            Ok(info) => {
                debug!(bot = %info.user_id, "LINE bot info ok");
                Ok(HealthStatus::Healthy)
            }
            Err(e) => Ok(HealthStatus::Degraded(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), KogotoError> {
        Ok(())
    }
}

#[async_trait]
impl TransportAdapter for LineChannel {
    async fn reply(&self, reply_token: &str, text: &str) -> Result<(), KogotoError> {
        self.client.reply(reply_token, text).await
    }

    async fn push(&self, to: &str, text: &str) -> Result<(), KogotoError> {
        self.client.push(to, text).await
    }
}
