// SPDX-FileCopyrightText: 2026 Blufio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Kogoto complaint relay.
//!
//! This crate provides the error type, the domain types, and the adapter
//! traits that the relay pipeline is written against. Concrete adapters
//! (SQLite, LINE, Dify) and their test fakes implement the traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::KogotoError;
pub use types::{
    AdapterType, ComplaintRecord, EventContent, HealthStatus, InboundEvent, MessageEvent,
    MessageHistory, NewComplaint, NewMessageHistory, SYSTEM_SENDER_ID, SendingTime, Sentiment,
    SentimentAnalysis, SentimentResult, SettingsUpdate, UserRelationship, UserSettings,
};

// Re-export all adapter traits at crate root.
pub use traits::{
    ClassifierAdapter, ComposerAdapter, PluginAdapter, StorageAdapter, TransportAdapter,
};
