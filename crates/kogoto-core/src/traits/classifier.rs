// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sentiment classifier trait.

use async_trait::async_trait;

use crate::error::KogotoError;
use crate::traits::adapter::PluginAdapter;
use crate::types::SentimentResult;

/// Classifies the sentiment of a raw complaint and summarizes it.
#[async_trait]
pub trait ClassifierAdapter: PluginAdapter {
    async fn classify(&self, text: &str) -> Result<SentimentResult, KogotoError>;
}
