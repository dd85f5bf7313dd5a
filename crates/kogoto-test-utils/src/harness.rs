// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end relay tests.
//!
//! `TestHarness` wires the intake handler, delivery scheduler, and recipient
//! command handler to mock adapters and a temp SQLite database.

use std::sync::Arc;

use kogoto_config::model::{KogotoConfig, StorageConfig};
use kogoto_core::{KogotoError, StorageAdapter};
use kogoto_relay::{DeliveryScheduler, IntakeHandler, RecipientHandler};
use kogoto_storage::SqliteStorage;

use crate::mock_provider::{MockClassifier, MockComposer};
use crate::mock_transport::MockTransport;

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    config: KogotoConfig,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config: KogotoConfig::default(),
        }
    }

    /// Replace the whole config. The storage path is always overridden.
    pub fn with_config(mut self, config: KogotoConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.config.scheduler.batch_size = batch_size;
        self
    }

    pub fn with_window_minutes(mut self, minutes: u32) -> Self {
        self.config.scheduler.window_minutes = minutes;
        self
    }

    pub async fn build(mut self) -> Result<TestHarness, KogotoError> {
        let temp_dir = tempfile::TempDir::new().map_err(KogotoError::storage)?;
        let db_path = temp_dir.path().join("test.db");
        self.config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: true,
        };

        let storage = SqliteStorage::new(self.config.storage.clone());
        storage.initialize().await?;
        let storage = Arc::new(storage);

        let classifier = Arc::new(MockClassifier::new());
        let composer = Arc::new(MockComposer::new());
        let sender_transport = Arc::new(MockTransport::new());
        let recipient_transport = Arc::new(MockTransport::new());

        let intake = Arc::new(IntakeHandler::new(
            classifier.clone(),
            composer.clone(),
            storage.clone(),
            sender_transport.clone(),
            self.config.relay.clone(),
        ));
        let scheduler = Arc::new(DeliveryScheduler::new(
            storage.clone(),
            composer.clone(),
            recipient_transport.clone(),
            self.config.scheduler.clone(),
        ));
        let recipient = Arc::new(RecipientHandler::new(
            storage.clone(),
            recipient_transport.clone(),
            &self.config.relay,
        )?);

        Ok(TestHarness {
            classifier,
            composer,
            sender_transport,
            recipient_transport,
            storage,
            intake,
            scheduler,
            recipient,
            config: self.config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete relay with mock adapters and temp storage.
pub struct TestHarness {
    pub classifier: Arc<MockClassifier>,
    pub composer: Arc<MockComposer>,
    /// Channel the complaining user talks to.
    pub sender_transport: Arc<MockTransport>,
    /// Channel the linked recipient talks to.
    pub recipient_transport: Arc<MockTransport>,
    /// SQLite storage (temp DB, removed on drop).
    pub storage: Arc<SqliteStorage>,
    pub intake: Arc<IntakeHandler>,
    pub scheduler: Arc<DeliveryScheduler>,
    pub recipient: Arc<RecipientHandler>,
    pub config: KogotoConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Storage as the trait object the relay components hold.
    pub fn store(&self) -> Arc<dyn StorageAdapter> {
        self.storage.clone()
    }
}
