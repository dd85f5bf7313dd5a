// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dify provider adapter for the Kogoto relay.
//!
//! One [`DifyProvider`] implements both [`ClassifierAdapter`] and
//! [`ComposerAdapter`] on top of the Dify chat-messages API. Each role uses a
//! distinct Dify end-user id so conversations stay separate on the Dify side.

pub mod client;
pub mod parse;
pub mod prompts;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use kogoto_config::model::DifyConfig;
use kogoto_core::{
    AdapterType, ClassifierAdapter, ComplaintRecord, ComposerAdapter, HealthStatus, KogotoError,
    PluginAdapter, SentimentResult,
};
use tracing::{debug, info};

use crate::client::DifyClient;

const CLASSIFIER_USER: &str = "kogoto-classifier";
const COMPOSER_USER: &str = "kogoto-composer";
const CARE_USER: &str = "kogoto-care";

/// Dify-backed classifier and composer.
pub struct DifyProvider {
    client: DifyClient,
}

impl DifyProvider {
    /// Creates the provider from configuration.
    ///
    /// Fails when `dify.api_key` is missing or empty.
    pub fn new(config: &DifyConfig) -> Result<Self, KogotoError> {
        let api_key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                KogotoError::Config(
                    "dify.api_key is required (set it in kogoto.toml or KOGOTO_DIFY_API_KEY)"
                        .into(),
                )
            })?;

        let client = DifyClient::new(
            api_key,
            &config.api_url,
            Duration::from_secs(config.timeout_secs),
        )?;
        info!(api_url = %config.api_url, "Dify provider initialized");
        Ok(Self { client })
    }
}

#[async_trait]
impl PluginAdapter for DifyProvider {
    fn name(&self) -> &str {
        "dify"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, KogotoError> {
        // Every Dify call is billed, so the check does not touch the network.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), KogotoError> {
        debug!("Dify provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ClassifierAdapter for DifyProvider {
    async fn classify(&self, text: &str) -> Result<SentimentResult, KogotoError> {
        let answer = self.client.chat(text, CLASSIFIER_USER).await?;
        let result = parse::parse_classification(&answer);
        debug!(sentiment = %result.sentiment, score = result.score, "complaint classified");
        Ok(result)
    }
}

#[async_trait]
impl ComposerAdapter for DifyProvider {
    async fn compose_for_recipient(
        &self,
        complaints: &[ComplaintRecord],
    ) -> Result<String, KogotoError> {
        let prompt = prompts::recipient_prompt(complaints);
        let answer = self.client.chat(&prompt, COMPOSER_USER).await?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(KogotoError::provider("Dify returned an empty message"));
        }
        Ok(answer.to_string())
    }

    async fn compose_care_message(
        &self,
        recent: &[ComplaintRecord],
    ) -> Result<Option<String>, KogotoError> {
        let prompt = prompts::care_prompt(recent);
        let answer = self.client.chat(&prompt, CARE_USER).await?;
        if parse::is_no_message(&answer) {
            return Ok(None);
        }
        Ok(Some(answer.trim().to_string()))
    }
}
