// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock messaging transport that captures replies and pushes.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use kogoto_core::{AdapterType, HealthStatus, KogotoError, PluginAdapter, TransportAdapter};

/// Records every reply as `(reply_token, text)` and every push as `(to, text)`.
///
/// Failed calls are not recorded.
pub struct MockTransport {
    replies: Mutex<Vec<(String, String)>>,
    pushes: Mutex<Vec<(String, String)>>,
    fail_replies: AtomicBool,
    fail_pushes: AtomicBool,
    failing_recipients: Mutex<HashSet<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(Vec::new()),
            pushes: Mutex::new(Vec::new()),
            fail_replies: AtomicBool::new(false),
            fail_pushes: AtomicBool::new(false),
            failing_recipients: Mutex::new(HashSet::new()),
        }
    }

    pub async fn replies(&self) -> Vec<(String, String)> {
        self.replies.lock().await.clone()
    }

    pub async fn pushes(&self) -> Vec<(String, String)> {
        self.pushes.lock().await.clone()
    }

    pub fn fail_replies(&self, fail: bool) {
        self.fail_replies.store(fail, Ordering::SeqCst);
    }

    pub fn fail_pushes(&self, fail: bool) {
        self.fail_pushes.store(fail, Ordering::SeqCst);
    }

    /// Fail pushes addressed to `to` only.
    pub async fn fail_pushes_to(&self, to: &str) {
        self.failing_recipients.lock().await.insert(to.to_string());
    }

    pub async fn clear(&self) {
        self.replies.lock().await.clear();
        self.pushes.lock().await.clear();
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockTransport {
    fn name(&self) -> &str {
        "mock-transport"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, KogotoError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), KogotoError> {
        Ok(())
    }
}

#[async_trait]
impl TransportAdapter for MockTransport {
    async fn reply(&self, reply_token: &str, text: &str) -> Result<(), KogotoError> {
        if self.fail_replies.load(Ordering::SeqCst) {
            return Err(KogotoError::transport("mock reply failure"));
        }
        self.replies
            .lock()
            .await
            .push((reply_token.to_string(), text.to_string()));
        Ok(())
    }

    async fn push(&self, to: &str, text: &str) -> Result<(), KogotoError> {
        if self.fail_pushes.load(Ordering::SeqCst)
            || self.failing_recipients.lock().await.contains(to)
        {
            return Err(KogotoError::transport(format!("mock push to {to} failed")));
        }
        self.pushes
            .lock()
            .await
            .push((to.to_string(), text.to_string()));
        Ok(())
    }
}
