// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory [`StorageAdapter`] with failure injection.
//!
//! Mirrors the SQLite adapter's observable behavior (ordering, idempotent
//! relationship registration, one-way processed flag) without touching disk.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use kogoto_core::{
    AdapterType, ComplaintRecord, HealthStatus, KogotoError, MessageHistory, NewComplaint,
    NewMessageHistory, PluginAdapter, SettingsUpdate, StorageAdapter, UserRelationship,
    UserSettings,
};

#[derive(Default)]
struct Tables {
    complaints: Vec<ComplaintRecord>,
    history: Vec<MessageHistory>,
    settings: Vec<UserSettings>,
    relationships: Vec<UserRelationship>,
}

pub struct MemoryStorage {
    tables: Mutex<Tables>,
    next_id: AtomicI64,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            next_id: AtomicI64::new(1),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every read fail with a storage error.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every write fail with a storage error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn complaint_count(&self) -> usize {
        self.tables.lock().await.complaints.len()
    }

    fn check_read(&self) -> Result<(), KogotoError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(KogotoError::storage("injected read failure"));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), KogotoError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(KogotoError::storage("injected write failure"));
        }
        Ok(())
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn now() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}

#[async_trait]
impl PluginAdapter for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, KogotoError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Ok(HealthStatus::Unhealthy("injected read failure".into()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), KogotoError> {
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for MemoryStorage {
    async fn initialize(&self) -> Result<(), KogotoError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), KogotoError> {
        Ok(())
    }

    async fn insert_complaint(
        &self,
        complaint: &NewComplaint,
    ) -> Result<ComplaintRecord, KogotoError> {
        self.check_write()?;
        let mut tables = self.tables.lock().await;
        if let Some(event_id) = &complaint.event_id
            && tables
                .complaints
                .iter()
                .any(|c| c.event_id.as_ref() == Some(event_id))
        {
            return Err(KogotoError::storage(format!(
                "duplicate event id {event_id}"
            )));
        }
        let record = ComplaintRecord {
            id: self.next_id(),
            sender_id: complaint.sender_id.clone(),
            event_id: complaint.event_id.clone(),
            posted_at: now(),
            original_text: complaint.original_text.clone(),
            sentiment_analysis: complaint.sentiment_analysis,
            summary: complaint.summary.clone(),
            processed: false,
        };
        tables.complaints.push(record.clone());
        Ok(record)
    }

    async fn get_complaint(&self, id: i64) -> Result<Option<ComplaintRecord>, KogotoError> {
        self.check_read()?;
        let tables = self.tables.lock().await;
        Ok(tables.complaints.iter().find(|c| c.id == id).cloned())
    }

    async fn complaint_exists_for_event(&self, event_id: &str) -> Result<bool, KogotoError> {
        self.check_read()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .complaints
            .iter()
            .any(|c| c.event_id.as_deref() == Some(event_id)))
    }

    async fn list_unprocessed_complaints(
        &self,
        limit: usize,
    ) -> Result<Vec<ComplaintRecord>, KogotoError> {
        self.check_read()?;
        let tables = self.tables.lock().await;
        let mut pending: Vec<ComplaintRecord> = tables
            .complaints
            .iter()
            .filter(|c| !c.processed)
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.posted_at.cmp(&b.posted_at).then(a.id.cmp(&b.id)));
        pending.truncate(limit);
        Ok(pending)
    }

    async fn mark_complaint_processed(&self, id: i64) -> Result<bool, KogotoError> {
        self.check_write()?;
        let mut tables = self.tables.lock().await;
        match tables
            .complaints
            .iter_mut()
            .find(|c| c.id == id && !c.processed)
        {
            Some(c) => {
                c.processed = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn append_message_history(
        &self,
        entry: &NewMessageHistory,
    ) -> Result<MessageHistory, KogotoError> {
        self.check_write()?;
        let row = MessageHistory {
            id: self.next_id(),
            sender_id: entry.sender_id.clone(),
            receiver_id: entry.receiver_id.clone(),
            sent_at: now(),
            content: entry.content.clone(),
        };
        self.tables.lock().await.history.push(row.clone());
        Ok(row)
    }

    async fn list_message_history(
        &self,
        receiver_id: &str,
        limit: usize,
    ) -> Result<Vec<MessageHistory>, KogotoError> {
        self.check_read()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .history
            .iter()
            .rev()
            .filter(|h| h.receiver_id == receiver_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_user_settings(&self, user_id: &str) -> Result<Option<UserSettings>, KogotoError> {
        self.check_read()?;
        let tables = self.tables.lock().await;
        Ok(tables.settings.iter().find(|s| s.user_id == user_id).cloned())
    }

    async fn upsert_user_settings(
        &self,
        update: &SettingsUpdate,
    ) -> Result<UserSettings, KogotoError> {
        self.check_write()?;
        let row = UserSettings {
            user_id: update.user_id.clone(),
            sending_frequency: update.sending_frequency,
            sending_time: update.sending_time.to_string(),
            updated_at: now(),
        };
        let mut tables = self.tables.lock().await;
        match tables.settings.iter_mut().find(|s| s.user_id == update.user_id) {
            Some(existing) => *existing = row.clone(),
            None => tables.settings.push(row.clone()),
        }
        Ok(row)
    }

    async fn register_relationship(
        &self,
        sender_id: &str,
        recipient_id: &str,
    ) -> Result<UserRelationship, KogotoError> {
        self.check_write()?;
        let mut tables = self.tables.lock().await;
        if let Some(existing) = tables
            .relationships
            .iter()
            .find(|r| r.sender_id == sender_id && r.recipient_id == recipient_id)
        {
            return Ok(existing.clone());
        }
        let link = UserRelationship {
            id: self.next_id(),
            sender_id: sender_id.to_string(),
            recipient_id: recipient_id.to_string(),
            created_at: now(),
        };
        tables.relationships.push(link.clone());
        Ok(link)
    }

    async fn find_recipient_for_sender(
        &self,
        sender_id: &str,
    ) -> Result<Option<String>, KogotoError> {
        self.check_read()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .relationships
            .iter()
            .find(|r| r.sender_id == sender_id)
            .map(|r| r.recipient_id.clone()))
    }

    async fn find_sender_for_recipient(
        &self,
        recipient_id: &str,
    ) -> Result<Option<String>, KogotoError> {
        self.check_read()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .relationships
            .iter()
            .find(|r| r.recipient_id == recipient_id)
            .map(|r| r.sender_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complaint(sender: &str) -> NewComplaint {
        NewComplaint {
            sender_id: sender.into(),
            event_id: None,
            original_text: "t".into(),
            sentiment_analysis: None,
            summary: None,
        }
    }

    #[tokio::test]
    async fn processed_flag_flips_once() {
        let storage = MemoryStorage::new();
        let id = storage.insert_complaint(&complaint("w1")).await.unwrap().id;

        assert!(storage.mark_complaint_processed(id).await.unwrap());
        assert!(!storage.mark_complaint_processed(id).await.unwrap());
        assert!(storage.list_unprocessed_complaints(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn relationship_registration_is_idempotent() {
        let storage = MemoryStorage::new();
        let first = storage.register_relationship("w1", "h1").await.unwrap();
        let second = storage.register_relationship("w1", "h1").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(
            storage.find_sender_for_recipient("h1").await.unwrap().as_deref(),
            Some("w1")
        );
    }

    #[tokio::test]
    async fn injected_failures_surface_as_storage_errors() {
        let storage = MemoryStorage::new();
        storage.fail_writes(true);
        let err = storage.insert_complaint(&complaint("w1")).await.unwrap_err();
        assert!(matches!(err, KogotoError::Storage { .. }));
    }
}
