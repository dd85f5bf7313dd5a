// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use kogoto_config::model::StorageConfig;
use kogoto_core::{
    AdapterType, ComplaintRecord, HealthStatus, KogotoError, MessageHistory, NewComplaint,
    NewMessageHistory, PluginAdapter, SettingsUpdate, StorageAdapter, UserRelationship,
    UserSettings,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is opened by
/// [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`StorageAdapter::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, KogotoError> {
        self.db
            .get()
            .ok_or_else(|| KogotoError::storage("storage not initialized -- call initialize() first"))
    }

    async fn checkpoint(db: &Database) -> Result<(), KogotoError> {
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, KogotoError> {
        let Some(db) = self.db.get() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        let probe = db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT 1", [], |row| row.get(0))
            })
            .await;
        Ok(match probe {
            Ok(_) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }

    async fn shutdown(&self) -> Result<(), KogotoError> {
        if let Some(db) = self.db.get() {
            Self::checkpoint(db).await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), KogotoError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db
            .set(db)
            .map_err(|_| KogotoError::storage("storage already initialized"))?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), KogotoError> {
        Self::checkpoint(self.db()?).await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Complaints ---

    async fn insert_complaint(
        &self,
        complaint: &NewComplaint,
    ) -> Result<ComplaintRecord, KogotoError> {
        queries::complaints::insert_complaint(self.db()?, complaint).await
    }

    async fn get_complaint(&self, id: i64) -> Result<Option<ComplaintRecord>, KogotoError> {
        queries::complaints::get_complaint(self.db()?, id).await
    }

    async fn complaint_exists_for_event(&self, event_id: &str) -> Result<bool, KogotoError> {
        queries::complaints::exists_for_event(self.db()?, event_id).await
    }

    async fn list_unprocessed_complaints(
        &self,
        limit: usize,
    ) -> Result<Vec<ComplaintRecord>, KogotoError> {
        queries::complaints::list_unprocessed(self.db()?, limit).await
    }

    async fn mark_complaint_processed(&self, id: i64) -> Result<bool, KogotoError> {
        queries::complaints::mark_processed(self.db()?, id).await
    }

    // --- Message history ---

    async fn append_message_history(
        &self,
        entry: &NewMessageHistory,
    ) -> Result<MessageHistory, KogotoError> {
        queries::history::append(self.db()?, entry).await
    }

    async fn list_message_history(
        &self,
        receiver_id: &str,
        limit: usize,
    ) -> Result<Vec<MessageHistory>, KogotoError> {
        queries::history::list_for_receiver(self.db()?, receiver_id, limit).await
    }

    // --- Settings ---

    async fn get_user_settings(&self, user_id: &str) -> Result<Option<UserSettings>, KogotoError> {
        queries::settings::get(self.db()?, user_id).await
    }

    async fn upsert_user_settings(
        &self,
        update: &SettingsUpdate,
    ) -> Result<UserSettings, KogotoError> {
        queries::settings::upsert(self.db()?, update).await
    }

    // --- Relationships ---

    async fn register_relationship(
        &self,
        sender_id: &str,
        recipient_id: &str,
    ) -> Result<UserRelationship, KogotoError> {
        queries::relationships::register(self.db()?, sender_id, recipient_id).await
    }

    async fn find_recipient_for_sender(
        &self,
        sender_id: &str,
    ) -> Result<Option<String>, KogotoError> {
        queries::relationships::recipient_for_sender(self.db()?, sender_id).await
    }

    async fn find_sender_for_recipient(
        &self,
        recipient_id: &str,
    ) -> Result<Option<String>, KogotoError> {
        queries::relationships::sender_for_recipient(self.db()?, recipient_id).await
    }
}
