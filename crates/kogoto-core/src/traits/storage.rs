// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for the persistence store.

use async_trait::async_trait;

use crate::error::KogotoError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    ComplaintRecord, MessageHistory, NewComplaint, NewMessageHistory, SettingsUpdate,
    UserRelationship, UserSettings,
};

/// Adapter for the relay's persistence backend.
///
/// "Not found" is always `Ok(None)`; `Err` is reserved for backend failures.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), KogotoError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), KogotoError>;

    // --- Complaints ---

    /// Persists a new complaint with `processed = false` and returns the stored row.
    async fn insert_complaint(&self, complaint: &NewComplaint)
    -> Result<ComplaintRecord, KogotoError>;

    async fn get_complaint(&self, id: i64) -> Result<Option<ComplaintRecord>, KogotoError>;

    /// True when a complaint already carries this webhook event id.
    async fn complaint_exists_for_event(&self, event_id: &str) -> Result<bool, KogotoError>;

    /// Up to `limit` unprocessed complaints, oldest first.
    async fn list_unprocessed_complaints(
        &self,
        limit: usize,
    ) -> Result<Vec<ComplaintRecord>, KogotoError>;

    /// Marks one complaint processed. Returns false if it was already processed
    /// or does not exist.
    async fn mark_complaint_processed(&self, id: i64) -> Result<bool, KogotoError>;

    // --- Message history ---

    async fn append_message_history(
        &self,
        entry: &NewMessageHistory,
    ) -> Result<MessageHistory, KogotoError>;

    /// Most recent entries for a receiver, newest first.
    async fn list_message_history(
        &self,
        receiver_id: &str,
        limit: usize,
    ) -> Result<Vec<MessageHistory>, KogotoError>;

    // --- Settings ---

    async fn get_user_settings(&self, user_id: &str) -> Result<Option<UserSettings>, KogotoError>;

    async fn upsert_user_settings(
        &self,
        update: &SettingsUpdate,
    ) -> Result<UserSettings, KogotoError>;

    // --- Relationships ---

    /// Registers a link, returning the existing one if the pair is already known.
    async fn register_relationship(
        &self,
        sender_id: &str,
        recipient_id: &str,
    ) -> Result<UserRelationship, KogotoError>;

    async fn find_recipient_for_sender(
        &self,
        sender_id: &str,
    ) -> Result<Option<String>, KogotoError>;

    async fn find_sender_for_recipient(
        &self,
        recipient_id: &str,
    ) -> Result<Option<String>, KogotoError>;
}
