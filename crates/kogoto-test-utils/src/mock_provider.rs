// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock classifier and composer adapters.
//!
//! `MockClassifier` returns queued [`SentimentResult`]s and `MockComposer`
//! returns configured messages, so relay tests run without a Dify app.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use kogoto_core::{
    AdapterType, ClassifierAdapter, ComplaintRecord, ComposerAdapter, HealthStatus, KogotoError,
    PluginAdapter, Sentiment, SentimentResult,
};

/// A classifier that pops results from a FIFO queue.
///
/// When the queue is empty, a neutral 0.5 result with summary
/// `"mock summary"` is returned.
pub struct MockClassifier {
    results: Mutex<VecDeque<SentimentResult>>,
    inputs: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl MockClassifier {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(VecDeque::new()),
            inputs: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    /// Queue one result for the next `classify` call.
    pub async fn push_result(&self, sentiment: Sentiment, score: f64, summary: &str) {
        self.results.lock().await.push_back(SentimentResult {
            sentiment,
            score,
            summary: summary.to_string(),
        });
    }

    /// Make every `classify` call fail until reset.
    pub fn fail_next(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of `classify` calls so far.
    pub async fn calls(&self) -> usize {
        self.inputs.lock().await.len()
    }

    pub async fn inputs(&self) -> Vec<String> {
        self.inputs.lock().await.clone()
    }
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockClassifier {
    fn name(&self) -> &str {
        "mock-classifier"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, KogotoError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), KogotoError> {
        Ok(())
    }
}

#[async_trait]
impl ClassifierAdapter for MockClassifier {
    async fn classify(&self, text: &str) -> Result<SentimentResult, KogotoError> {
        self.inputs.lock().await.push(text.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(KogotoError::provider("mock classifier failure"));
        }
        Ok(self
            .results
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| SentimentResult {
                sentiment: Sentiment::Neutral,
                score: 0.5,
                summary: "mock summary".to_string(),
            }))
    }
}

/// Holds `compose_for_recipient` calls open until released.
pub struct ComposeGate {
    release: Arc<Notify>,
}

impl ComposeGate {
    pub fn release(self) {
        self.release.notify_one();
    }
}

/// A composer with fixed outputs and captured inputs.
pub struct MockComposer {
    recipient_message: Mutex<String>,
    care_message: Mutex<Option<String>>,
    composed: Mutex<Vec<Vec<i64>>>,
    care_inputs: Mutex<Vec<Vec<i64>>>,
    fail_compose: AtomicBool,
    fail_care: AtomicBool,
    hold: Mutex<Option<Arc<Notify>>>,
    started: Notify,
}

impl MockComposer {
    /// Composes `"mock combined message"` and the care message
    /// `"Take care of yourself."` until configured otherwise.
    pub fn new() -> Self {
        Self {
            recipient_message: Mutex::new("mock combined message".to_string()),
            care_message: Mutex::new(Some("Take care of yourself.".to_string())),
            composed: Mutex::new(Vec::new()),
            care_inputs: Mutex::new(Vec::new()),
            fail_compose: AtomicBool::new(false),
            fail_care: AtomicBool::new(false),
            hold: Mutex::new(None),
            started: Notify::new(),
        }
    }

    pub async fn set_recipient_message(&self, message: &str) {
        *self.recipient_message.lock().await = message.to_string();
    }

    pub async fn set_care_message(&self, message: Option<String>) {
        *self.care_message.lock().await = message;
    }

    pub fn fail_compose(&self, fail: bool) {
        self.fail_compose.store(fail, Ordering::SeqCst);
    }

    pub fn fail_care(&self, fail: bool) {
        self.fail_care.store(fail, Ordering::SeqCst);
    }

    /// Complaint ids passed to each `compose_for_recipient` call.
    pub async fn composed_batches(&self) -> Vec<Vec<i64>> {
        self.composed.lock().await.clone()
    }

    pub async fn care_calls(&self) -> usize {
        self.care_inputs.lock().await.len()
    }

    /// Blocks subsequent compositions until the returned gate is released.
    pub async fn hold_compositions(&self) -> ComposeGate {
        let release = Arc::new(Notify::new());
        *self.hold.lock().await = Some(release.clone());
        ComposeGate { release }
    }

    /// Resolves once a composition has started.
    pub async fn wait_for_compose_started(&self) {
        self.started.notified().await;
    }
}

impl Default for MockComposer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockComposer {
    fn name(&self) -> &str {
        "mock-composer"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, KogotoError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), KogotoError> {
        Ok(())
    }
}

#[async_trait]
impl ComposerAdapter for MockComposer {
    async fn compose_for_recipient(
        &self,
        complaints: &[ComplaintRecord],
    ) -> Result<String, KogotoError> {
        self.composed
            .lock()
            .await
            .push(complaints.iter().map(|c| c.id).collect());
        self.started.notify_one();

        let hold = self.hold.lock().await.take();
        if let Some(release) = hold {
            release.notified().await;
        }

        if self.fail_compose.load(Ordering::SeqCst) {
            return Err(KogotoError::provider("mock composer failure"));
        }
        Ok(self.recipient_message.lock().await.clone())
    }

    async fn compose_care_message(
        &self,
        recent: &[ComplaintRecord],
    ) -> Result<Option<String>, KogotoError> {
        self.care_inputs
            .lock()
            .await
            .push(recent.iter().map(|c| c.id).collect());
        if self.fail_care.load(Ordering::SeqCst) {
            return Err(KogotoError::provider("mock care failure"));
        }
        Ok(self.care_message.lock().await.clone())
    }
}
